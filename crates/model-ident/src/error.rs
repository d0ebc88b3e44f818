//! Error types for the model identification crate.

use esda_common::DatasetError;
use thiserror::Error;

/// Errors that can occur while identifying, validating or standardizing a dataset.
#[derive(Error, Debug)]
pub enum IdentError {
    /// No registry entry matched by metadata or vertical fingerprint.
    #[error("Dataset not identifiable: no registry entry matched by metadata or vertical levels (observed levels: {})", describe_levels(.levels))]
    NotIdentifiable { levels: Option<usize> },

    /// The dataset breaks the resolved model's contract.
    #[error("Contract violation for model '{model}': {violation}")]
    ContractViolation { model: String, violation: Violation },

    /// The registry names an adapter that has no implementation.
    #[error("Unknown interface '{adapter}' for model '{model}'")]
    UnknownInterface { model: String, adapter: String },

    /// A caller asked for a model key the registry does not know.
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Invalid registry configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Invalid dataset: {0}")]
    Dataset(#[from] DatasetError),
}

fn describe_levels(levels: &Option<usize>) -> String {
    match levels {
        Some(n) => n.to_string(),
        None => "no vertical axis".to_string(),
    }
}

/// The contract factor a dataset failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Violation {
    #[error("horizontal resolution {} does not match declared {expected} deg (tolerance {tolerance} deg)", describe_spacing(.observed))]
    Resolution {
        expected: f64,
        /// Mean longitude spacing, `None` when the dataset has no usable longitude axis
        observed: Option<f64>,
        tolerance: f64,
    },

    #[error("missing required variables: {}", .0.join(", "))]
    MissingVariables(Vec<String>),

    #[error("missing values (NaN) found in: {}", .variables.join(", "))]
    MissingValues { variables: Vec<String> },
}

fn describe_spacing(observed: &Option<f64>) -> String {
    match observed {
        Some(spacing) => format!("{spacing} deg"),
        None => "unavailable (no usable longitude axis)".to_string(),
    }
}

impl Violation {
    /// Short name of the violated factor, for logs and reports.
    pub fn factor(&self) -> &'static str {
        match self {
            Violation::Resolution { .. } => "resolution",
            Violation::MissingVariables(_) => "required_variables",
            Violation::MissingValues { .. } => "integrity",
        }
    }
}

/// Result type for identification operations.
pub type Result<T> = std::result::Result<T, IdentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_identifiable_names_level_count() {
        let err = IdentError::NotIdentifiable { levels: Some(17) };
        assert!(err.to_string().contains("17"));

        let err = IdentError::NotIdentifiable { levels: None };
        assert!(err.to_string().contains("no vertical axis"));
    }

    #[test]
    fn test_violation_messages() {
        let v = Violation::MissingVariables(vec!["q".into(), "sp".into()]);
        assert_eq!(v.to_string(), "missing required variables: q, sp");
        assert_eq!(v.factor(), "required_variables");

        let v = Violation::Resolution {
            expected: 0.25,
            observed: Some(0.5),
            tolerance: 0.01,
        };
        assert!(v.to_string().contains("0.5 deg"));
        assert_eq!(v.factor(), "resolution");
    }
}
