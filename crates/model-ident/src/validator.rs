//! Contract validation.
//!
//! Checks run in a fixed order and stop at the first failed factor:
//! resolution, then required variables, then NaN integrity.

use crate::error::{IdentError, Result, Violation};
use crate::registry::Registry;
use crate::spec::ModelSpec;
use esda_common::{axes, Dataset};
use rayon::prelude::*;
use tracing::{debug, warn};

/// Absolute tolerance (degrees) on the mean longitude spacing.
pub const RESOLUTION_TOLERANCE: f64 = 0.01;

/// Absolute mean first difference of an axis.
///
/// `None` for axes with fewer than two points or non-finite ends.
pub fn mean_spacing(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    // The mean of first differences telescopes to (last - first) / (n - 1).
    let span = values[values.len() - 1] - values[0];
    let spacing = (span / (values.len() - 1) as f64).abs();
    spacing.is_finite().then_some(spacing)
}

/// Names of variables holding at least one NaN, sorted.
pub fn variables_with_nan(dataset: &Dataset) -> Vec<String> {
    let mut names: Vec<String> = dataset
        .variables
        .par_iter()
        .filter(|(_, variable)| variable.has_nan())
        .map(|(name, _)| name.clone())
        .collect();
    names.sort();
    names
}

/// Check a dataset against one spec, returning the first violated factor.
pub fn check_contract(dataset: &Dataset, spec: &ModelSpec) -> std::result::Result<(), Violation> {
    check_contract_with(dataset, spec, RESOLUTION_TOLERANCE)
}

fn check_contract_with(
    dataset: &Dataset,
    spec: &ModelSpec,
    tolerance: f64,
) -> std::result::Result<(), Violation> {
    if let Some(expected) = spec.resolution {
        let observed = dataset
            .find_axis(axes::LONGITUDE_ALIASES)
            .and_then(|name| dataset.coord(name))
            .and_then(|lon| mean_spacing(&lon.values));

        match observed {
            Some(spacing) if (spacing - expected).abs() <= tolerance => {}
            _ => {
                return Err(Violation::Resolution {
                    expected,
                    observed,
                    tolerance,
                })
            }
        }
    }

    let missing: Vec<String> = spec
        .required_variables
        .iter()
        .filter(|name| !dataset.has_variable(name))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(Violation::MissingVariables(missing));
    }

    if !spec.allow_nan {
        let variables = variables_with_nan(dataset);
        if !variables.is_empty() {
            return Err(Violation::MissingValues { variables });
        }
    }

    Ok(())
}

/// Validates datasets against the contract of a resolved registry key.
pub struct ContractValidator<'a> {
    registry: &'a Registry,
    tolerance: f64,
}

impl<'a> ContractValidator<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            tolerance: RESOLUTION_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Validate `dataset` against the contract registered under `key`.
    pub fn validate(&self, dataset: &Dataset, key: &str) -> Result<()> {
        let spec = self
            .registry
            .get(key)
            .ok_or_else(|| IdentError::UnknownModel(key.to_string()))?;
        self.validate_spec(dataset, spec)
    }

    pub fn validate_spec(&self, dataset: &Dataset, spec: &ModelSpec) -> Result<()> {
        match check_contract_with(dataset, spec, self.tolerance) {
            Ok(()) => {
                debug!(model = %spec.key, "Dataset satisfies model contract");
                Ok(())
            }
            Err(violation) => {
                warn!(
                    model = %spec.key,
                    factor = violation.factor(),
                    violation = %violation,
                    "Dataset violates model contract"
                );
                Err(IdentError::ContractViolation {
                    model: spec.key.clone(),
                    violation,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::ModelFamily;
    use esda_common::Variable;

    fn spec() -> ModelSpec {
        let mut spec = ModelSpec::new("toy", ModelFamily::GlobalDynamical);
        spec.resolution = Some(1.0);
        spec.required_variables = vec!["t".into(), "q".into(), "sp".into()];
        spec
    }

    fn field(value: f32) -> Variable {
        Variable::new(vec!["lon"], vec![4], vec![value; 4])
    }

    fn dataset() -> Dataset {
        Dataset::new()
            .with_coord("lon", vec![0.0, 1.0, 2.0, 3.0])
            .with_variable("t", field(280.0))
            .with_variable("q", field(0.01))
            .with_variable("sp", field(101325.0))
    }

    #[test]
    fn test_mean_spacing() {
        assert_eq!(mean_spacing(&[0.0, 0.25, 0.5]), Some(0.25));
        assert_eq!(mean_spacing(&[10.0, 9.5, 9.0]), Some(0.5));
        assert_eq!(mean_spacing(&[1.0]), None);
        assert_eq!(mean_spacing(&[]), None);
    }

    #[test]
    fn test_valid_dataset_passes() {
        assert_eq!(check_contract(&dataset(), &spec()), Ok(()));
    }

    #[test]
    fn test_resolution_checked_first() {
        let mut ds = dataset().with_coord("lon", vec![0.0, 2.0, 4.0, 6.0]);
        ds.remove_variable("q");
        ds.remove_variable("sp");
        assert!(matches!(
            check_contract(&ds, &spec()),
            Err(Violation::Resolution { observed: Some(o), .. }) if o == 2.0
        ));
    }

    #[test]
    fn test_resolution_within_tolerance() {
        let ds = dataset().with_coord("lon", vec![0.0, 1.005, 2.01, 3.015]);
        assert_eq!(check_contract(&ds, &spec()), Ok(()));
    }

    #[test]
    fn test_missing_longitude_is_resolution_violation() {
        let mut ds = dataset();
        ds.coords.clear();
        assert!(matches!(
            check_contract(&ds, &spec()),
            Err(Violation::Resolution { observed: None, .. })
        ));
    }

    #[test]
    fn test_all_missing_variables_listed() {
        let mut ds = dataset();
        ds.remove_variable("t");
        ds.remove_variable("sp");
        assert_eq!(
            check_contract(&ds, &spec()),
            Err(Violation::MissingVariables(vec!["t".into(), "sp".into()]))
        );
    }

    #[test]
    fn test_nan_policy() {
        let ds = dataset().with_variable(
            "extra",
            Variable::new(vec!["lon"], vec![4], vec![1.0, f32::NAN, 1.0, 1.0]),
        );
        assert_eq!(
            check_contract(&ds, &spec()),
            Err(Violation::MissingValues {
                variables: vec!["extra".into()]
            })
        );

        let mut lenient = spec();
        lenient.allow_nan = true;
        assert_eq!(check_contract(&ds, &lenient), Ok(()));
    }

    #[test]
    fn test_point_source_skips_resolution() {
        let registry = Registry::builtin();
        let ds = Dataset::new()
            .with_variable("tair", Variable::new(vec!["station"], vec![2], vec![290.0, f32::NAN]))
            .with_variable("pres", Variable::new(vec!["station"], vec![2], vec![1.0e5, 1.0e5]));
        assert!(ContractValidator::new(&registry).validate(&ds, "monitobs").is_ok());
    }

    #[test]
    fn test_validate_wraps_violation() {
        let registry = Registry::builtin();
        let err = ContractValidator::new(&registry)
            .validate(&Dataset::new(), "monitobs")
            .unwrap_err();
        match err {
            IdentError::ContractViolation { model, violation } => {
                assert_eq!(model, "monitobs");
                assert_eq!(violation.factor(), "required_variables");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
