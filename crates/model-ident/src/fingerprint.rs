//! Vertical-level fingerprint matching.
//!
//! A dataset's vertical coordinate is compared against every registry
//! entry's reference level set after sorting both ascending, so models that
//! store levels top-down and bottom-up match alike.

use crate::registry::Registry;
use crate::spec::ModelSpec;
use esda_common::{axes, Dataset};

/// Absolute tolerance for element-wise level comparison (hPa or m).
pub const LEVEL_TOLERANCE: f64 = 1e-3;

/// Values sorted ascending. NaN sorts last and never matches.
pub fn sorted_levels(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// True when both level sets have the same length and agree element-wise
/// (after sorting) within `tolerance`.
pub fn levels_match(observed: &[f64], reference: &[f64], tolerance: f64) -> bool {
    if observed.len() != reference.len() {
        return false;
    }
    let observed = sorted_levels(observed);
    let reference = sorted_levels(reference);
    observed
        .iter()
        .zip(&reference)
        .all(|(a, b)| (a - b).abs() <= tolerance)
}

/// The dataset's vertical axis: first recognised alias present.
pub fn vertical_axis(dataset: &Dataset) -> Option<(&'static str, &[f64])> {
    let name = dataset.find_axis(axes::VERTICAL_ALIASES)?;
    dataset.coord(name).map(|c| (name, c.values.as_slice()))
}

/// Matches vertical coordinates against the registry's level fingerprints.
pub struct FingerprintMatcher<'a> {
    registry: &'a Registry,
    tolerance: f64,
}

impl<'a> FingerprintMatcher<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            tolerance: LEVEL_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Every registry entry whose fingerprint matches `levels`, in
    /// enumeration order. Reference-only grids are never candidates.
    pub fn candidates(&self, levels: &[f64]) -> Vec<&'a ModelSpec> {
        self.registry
            .iter()
            .filter(|spec| {
                spec.levels
                    .as_ref()
                    .is_some_and(|fp| levels_match(levels, &fp.values, self.tolerance))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::builtin::{ERA5_37_LEVELS, WB13_LEVELS};

    #[test]
    fn test_match_any_order() {
        let mut reversed = WB13_LEVELS.to_vec();
        reversed.reverse();
        assert!(levels_match(&reversed, &WB13_LEVELS, LEVEL_TOLERANCE));
    }

    #[test]
    fn test_match_within_tolerance_only() {
        let drifted: Vec<f64> = WB13_LEVELS.iter().map(|v| v + 0.0009).collect();
        assert!(levels_match(&drifted, &WB13_LEVELS, LEVEL_TOLERANCE));

        let shifted: Vec<f64> = WB13_LEVELS.iter().map(|v| v + 0.01).collect();
        assert!(!levels_match(&shifted, &WB13_LEVELS, LEVEL_TOLERANCE));
    }

    #[test]
    fn test_length_mismatch_never_matches() {
        assert!(!levels_match(&WB13_LEVELS[..12], &WB13_LEVELS, LEVEL_TOLERANCE));
    }

    #[test]
    fn test_nan_never_matches() {
        let mut levels = WB13_LEVELS.to_vec();
        levels[3] = f64::NAN;
        assert!(!levels_match(&levels, &WB13_LEVELS, LEVEL_TOLERANCE));
    }

    #[test]
    fn test_candidates_in_enumeration_order() {
        let registry = Registry::builtin();
        let matcher = FingerprintMatcher::new(&registry);

        let keys: Vec<_> = matcher.candidates(&WB13_LEVELS).iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["pangu", "fuxi"]);

        let keys: Vec<_> = matcher.candidates(&ERA5_37_LEVELS).iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["anemoi", "graphcast"]);

        assert!(matcher.candidates(&[1.0, 2.0]).is_empty());
    }

    #[test]
    fn test_vertical_axis_precedence() {
        let ds = Dataset::new()
            .with_coord("plev", vec![1.0])
            .with_coord("lev", vec![2.0, 3.0]);
        let (name, values) = vertical_axis(&ds).unwrap();
        assert_eq!(name, "lev");
        assert_eq!(values.len(), 2);
    }
}
