//! Error types for cycle verification.

use esda_common::DatasetError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, VerificationError>;

#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Dataset has no '{0}' vertical axis")]
    MissingVerticalAxis(String),

    #[error("Need at least two source levels to interpolate, got {0}")]
    TooFewLevels(usize),

    #[error("Column has {values} values for {levels} source levels")]
    ColumnLength { levels: usize, values: usize },

    #[error("Pressure levels must be positive and finite, got {0}")]
    InvalidPressure(f64),

    #[error("Variable '{0}' not found")]
    MissingVariable(String),

    #[error("Variable '{variable}' has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        variable: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("No common variable spans the '{0}' dimension")]
    MissingDimension(String),

    #[error("Perturbation must be finite and non-zero, got {0}")]
    InvalidEpsilon(f64),

    #[error("Invalid cycle timestamp: date '{date}', cycle '{cycle}'")]
    InvalidTimestamp { date: String, cycle: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid dataset: {0}")]
    Dataset(#[from] DatasetError),
}
