//! Ordered free-form dataset attributes.

use serde::{Deserialize, Serialize};

/// Ordered list of `(key, value)` string pairs.
///
/// Producers often self-report their identity in global attributes
/// (`source`, `institution`, `model`), so the values are kept verbatim and
/// in insertion order. Keys are unique: inserting an existing key replaces
/// its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    /// Create an empty attribute list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Insert or replace an attribute, keeping the original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Remove an attribute, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(pos).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All values lower-cased and joined into one search string.
    ///
    /// Values are newline-separated; a key never matches across two values.
    pub fn search_text(&self) -> String {
        self.0
            .iter()
            .map(|(_, v)| v.to_lowercase())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (k, v) in iter {
            attrs.insert(k, v);
        }
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut attrs = Attributes::new();
        attrs.insert("source", "gfs");
        attrs.insert("history", "created");
        attrs.insert("source", "anemoi");

        let keys: Vec<_> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["source", "history"]);
        assert_eq!(attrs.get("source"), Some("anemoi"));
    }

    #[test]
    fn test_search_text_lowercases_values_only() {
        let attrs: Attributes = [("Source", "Anemoi Forecast"), ("Institution", "NCMRWF")]
            .into_iter()
            .collect();

        let text = attrs.search_text();
        assert!(text.contains("anemoi forecast"));
        assert!(text.contains("ncmrwf"));
        assert!(!text.contains("source"));
    }

    #[test]
    fn test_search_text_separates_values() {
        let attrs: Attributes = [("a", "pan"), ("b", "gu")].into_iter().collect();
        assert!(!attrs.search_text().contains("pangu"));
    }

    #[test]
    fn test_remove() {
        let mut attrs: Attributes = [("projection", "lambert")].into_iter().collect();
        assert_eq!(attrs.remove("projection"), Some("lambert".to_string()));
        assert!(attrs.is_empty());
        assert_eq!(attrs.remove("projection"), None);
    }
}
