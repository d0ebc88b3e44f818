//! In-memory gridded datasets.

use crate::attrs::Attributes;
use crate::error::{DatasetError, DatasetResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Deref;

/// A named 1-D coordinate axis (longitude, latitude, level, depth, time...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Axis values in storage order
    pub values: Vec<f64>,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attrs: Attributes,
}

impl Coordinate {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            attrs: Attributes::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An N-dimensional field stored flat in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Dimension names, outermost first
    pub dims: Vec<String>,
    /// Extent of each dimension
    pub shape: Vec<usize>,
    /// Row-major values; NaN marks a missing value (`null` in JSON)
    #[serde(with = "nan_as_null")]
    pub data: Vec<f32>,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attrs: Attributes,
}

impl Variable {
    /// Create a variable without checking that `data` fits `shape`.
    ///
    /// Use [`Dataset::insert_variable`] or [`Dataset::check`] to validate.
    pub fn new<S: Into<String>>(dims: Vec<S>, shape: Vec<usize>, data: Vec<f32>) -> Self {
        Self {
            dims: dims.into_iter().map(Into::into).collect(),
            shape,
            data,
            attrs: Attributes::new(),
        }
    }

    /// Create a variable with no dimensions holding a single value.
    pub fn scalar(value: f32) -> Self {
        Self::new(Vec::<String>::new(), Vec::new(), vec![value])
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Position of `dim` in this variable's dimension list.
    pub fn axis_index(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    /// Extent along `dim`, if the variable spans it and declares an extent for it.
    pub fn extent(&self, dim: &str) -> Option<usize> {
        self.axis_index(dim).and_then(|i| self.shape.get(i).copied())
    }

    pub fn spans(&self, dim: &str) -> bool {
        self.axis_index(dim).is_some()
    }

    pub fn has_nan(&self) -> bool {
        self.data.iter().any(|v| v.is_nan())
    }

    pub fn nan_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_nan()).count()
    }

    /// Copy of this variable with `f` applied to every value.
    pub fn map_values(&self, f: impl Fn(f32) -> f32) -> Variable {
        Variable {
            dims: self.dims.clone(),
            shape: self.shape.clone(),
            data: self.data.iter().map(|&v| f(v)).collect(),
            attrs: self.attrs.clone(),
        }
    }

    /// Check rank and element count against the declared shape.
    pub fn check(&self, name: &str) -> DatasetResult<()> {
        if self.dims.len() != self.shape.len() {
            return Err(DatasetError::RankMismatch {
                name: name.to_string(),
                dims: self.dims.len(),
                shape: self.shape.len(),
            });
        }
        let expected: usize = self.shape.iter().product();
        if expected != self.data.len() {
            return Err(DatasetError::ShapeMismatch {
                name: name.to_string(),
                shape: self.shape.clone(),
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }
}

/// JSON has no NaN, so missing values travel as `null`.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[f32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(data.iter().map(|v| if v.is_nan() { None } else { Some(*v) }))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f32>, D::Error> {
        let values = Vec::<Option<f32>>::deserialize(deserializer)?;
        Ok(values.into_iter().map(|v| v.unwrap_or(f32::NAN)).collect())
    }
}

/// A gridded dataset: variables, coordinate axes and global attributes.
///
/// Coordinates are keyed by their dimension name. Variables may also span
/// dimensions that carry no coordinate (station index, ensemble member).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub attrs: Attributes,
    #[serde(default)]
    pub coords: BTreeMap<String, Coordinate>,
    #[serde(default)]
    pub variables: BTreeMap<String, Variable>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key, value);
        self
    }

    pub fn with_coord(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.coords.insert(name.into(), Coordinate::new(values));
        self
    }

    /// Builder-style insert without shape checks.
    pub fn with_variable(mut self, name: impl Into<String>, variable: Variable) -> Self {
        self.variables.insert(name.into(), variable);
        self
    }

    pub fn insert_coord(&mut self, name: impl Into<String>, coord: Coordinate) {
        self.coords.insert(name.into(), coord);
    }

    /// Insert a variable after checking it against its shape and the
    /// dataset's coordinate axes.
    pub fn insert_variable(&mut self, name: impl Into<String>, variable: Variable) -> DatasetResult<()> {
        let name = name.into();
        self.check_variable(&name, &variable)?;
        self.variables.insert(name, variable);
        Ok(())
    }

    pub fn remove_variable(&mut self, name: &str) -> Option<Variable> {
        self.variables.remove(name)
    }

    /// Validate every variable against its shape and the coordinate axes.
    pub fn check(&self) -> DatasetResult<()> {
        for (name, variable) in &self.variables {
            self.check_variable(name, variable)?;
        }
        Ok(())
    }

    fn check_variable(&self, name: &str, variable: &Variable) -> DatasetResult<()> {
        variable.check(name)?;
        for (dim, &extent) in variable.dims.iter().zip(&variable.shape) {
            if let Some(coord) = self.coords.get(dim) {
                if coord.len() != extent {
                    return Err(DatasetError::AxisLengthMismatch {
                        name: name.to_string(),
                        dim: dim.clone(),
                        extent,
                        coord_len: coord.len(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn coord(&self, name: &str) -> Option<&Coordinate> {
        self.coords.get(name)
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn has_coord(&self, name: &str) -> bool {
        self.coords.contains_key(name)
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// First alias (in the given precedence order) present as a coordinate.
    pub fn find_axis<'a>(&self, aliases: &[&'a str]) -> Option<&'a str> {
        aliases.iter().copied().find(|alias| self.coords.contains_key(*alias))
    }

    /// Same as [`Dataset::find_axis`] for owned alias lists.
    pub fn find_axis_owned<'a>(&self, aliases: &'a [String]) -> Option<&'a str> {
        aliases
            .iter()
            .map(String::as_str)
            .find(|alias| self.coords.contains_key(*alias))
    }

    /// Rename a variable.
    ///
    /// Returns `false` and leaves the dataset untouched when `from` is absent
    /// or `to` is already taken.
    pub fn rename_variable(&mut self, from: &str, to: &str) -> bool {
        if from == to || self.variables.contains_key(to) {
            return false;
        }
        match self.variables.remove(from) {
            Some(variable) => {
                self.variables.insert(to.to_string(), variable);
                true
            }
            None => false,
        }
    }

    /// Rename a dimension: its coordinate (if any) and every variable's
    /// reference to it.
    ///
    /// Returns `false` when nothing was renamed because `from` is unused or
    /// a coordinate named `to` already exists.
    pub fn rename_dimension(&mut self, from: &str, to: &str) -> bool {
        if from == to || self.coords.contains_key(to) {
            return false;
        }
        let mut renamed = false;
        if let Some(coord) = self.coords.remove(from) {
            self.coords.insert(to.to_string(), coord);
            renamed = true;
        }
        for variable in self.variables.values_mut() {
            for dim in variable.dims.iter_mut().filter(|d| d.as_str() == from) {
                *dim = to.to_string();
                renamed = true;
            }
        }
        renamed
    }

    /// Replace the values of an existing coordinate, keeping its attributes.
    ///
    /// Returns `false` if the coordinate does not exist.
    pub fn set_coord_values(&mut self, name: &str, values: Vec<f64>) -> bool {
        match self.coords.get_mut(name) {
            Some(coord) => {
                coord.values = values;
                true
            }
            None => false,
        }
    }

    /// Merge another dataset into this one.
    ///
    /// Entries already present in `self` win; the caller is responsible for
    /// keeping the two sides' names disjoint where that matters.
    pub fn merge(&mut self, other: Dataset) {
        for (key, value) in other.attrs.iter() {
            if !self.attrs.contains_key(key) {
                self.attrs.insert(key, value);
            }
        }
        for (name, coord) in other.coords {
            self.coords.entry(name).or_insert(coord);
        }
        for (name, variable) in other.variables {
            self.variables.entry(name).or_insert(variable);
        }
    }
}

/// A dataset in canonical (DA-system) naming.
///
/// Produced once per identification and never mutated afterwards; it
/// dereferences to a read-only [`Dataset`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StandardizedDataset(Dataset);

impl StandardizedDataset {
    pub fn new(dataset: Dataset) -> Self {
        Self(dataset)
    }

    pub fn into_inner(self) -> Dataset {
        self.0
    }
}

impl Deref for StandardizedDataset {
    type Target = Dataset;

    fn deref(&self) -> &Dataset {
        &self.0
    }
}

impl AsRef<Dataset> for StandardizedDataset {
    fn as_ref(&self) -> &Dataset {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new()
            .with_coord("lon", vec![0.0, 1.0, 2.0])
            .with_coord("level", vec![1000.0, 500.0])
            .with_variable(
                "t",
                Variable::new(vec!["level", "lon"], vec![2, 3], vec![1.0; 6]),
            )
    }

    #[test]
    fn test_insert_variable_checks_shape() {
        let mut ds = Dataset::new();
        let err = ds
            .insert_variable("bad", Variable::new(vec!["x"], vec![3], vec![1.0, 2.0]))
            .unwrap_err();
        assert!(matches!(err, DatasetError::ShapeMismatch { expected: 3, actual: 2, .. }));
    }

    #[test]
    fn test_insert_variable_checks_axis_length() {
        let mut ds = Dataset::new().with_coord("lon", vec![0.0, 1.0]);
        let err = ds
            .insert_variable("t", Variable::new(vec!["lon"], vec![3], vec![0.0; 3]))
            .unwrap_err();
        assert!(matches!(err, DatasetError::AxisLengthMismatch { coord_len: 2, .. }));
    }

    #[test]
    fn test_rename_dimension_updates_variables() {
        let mut ds = sample();
        assert!(ds.rename_dimension("level", "lev"));
        assert!(ds.has_coord("lev"));
        assert!(!ds.has_coord("level"));
        assert_eq!(ds.variable("t").unwrap().dims, vec!["lev", "lon"]);
    }

    #[test]
    fn test_rename_dimension_refuses_collision() {
        let mut ds = sample().with_coord("lev", vec![1.0, 2.0]);
        assert!(!ds.rename_dimension("level", "lev"));
        assert!(ds.has_coord("level"));
    }

    #[test]
    fn test_rename_variable() {
        let mut ds = sample();
        assert!(ds.rename_variable("t", "air_temperature"));
        assert!(ds.has_variable("air_temperature"));
        assert!(!ds.rename_variable("t", "anything"));
    }

    #[test]
    fn test_find_axis_precedence() {
        let ds = Dataset::new()
            .with_coord("plev", vec![1.0])
            .with_coord("level", vec![2.0]);
        assert_eq!(ds.find_axis(&["level", "lev", "plev"]), Some("level"));
        assert_eq!(ds.find_axis(&["lev", "plev"]), Some("plev"));
        assert_eq!(ds.find_axis(&["depth"]), None);
    }

    #[test]
    fn test_merge_keeps_existing_entries() {
        let mut left = sample().with_attr("source", "atmosphere");
        let right = Dataset::new()
            .with_attr("source", "ocean")
            .with_coord("lon", vec![9.0, 9.0, 9.0])
            .with_coord("depth", vec![5.0]);
        left.merge(right);

        assert_eq!(left.attrs.get("source"), Some("atmosphere"));
        assert_eq!(left.coord("lon").unwrap().values, vec![0.0, 1.0, 2.0]);
        assert!(left.has_coord("depth"));
    }

    #[test]
    fn test_variable_nan_helpers() {
        let var = Variable::new(vec!["x"], vec![3], vec![1.0, f32::NAN, 3.0]);
        assert!(var.has_nan());
        assert_eq!(var.nan_count(), 1);
        assert_eq!(var.extent("x"), Some(3));
        assert_eq!(var.extent("y"), None);

        let ragged = Variable::new(vec!["x", "y"], vec![3], vec![0.0; 3]);
        assert_eq!(ragged.extent("x"), Some(3));
        assert_eq!(ragged.extent("y"), None);
    }
}
