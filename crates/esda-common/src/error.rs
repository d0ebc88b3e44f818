//! Error types for dataset construction and I/O.

use thiserror::Error;

/// Result type alias using DatasetError.
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Errors raised while building or (de)serializing a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Variable '{name}' has {actual} values but its shape {shape:?} needs {expected}")]
    ShapeMismatch {
        name: String,
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    #[error("Variable '{name}' declares {dims} dimensions but {shape} extents")]
    RankMismatch {
        name: String,
        dims: usize,
        shape: usize,
    },

    #[error("Variable '{name}' spans dimension '{dim}' with extent {extent}, but coordinate '{dim}' has {coord_len} values")]
    AxisLengthMismatch {
        name: String,
        dim: String,
        extent: usize,
        coord_len: usize,
    },

    #[error("Failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid dataset document: {0}")]
    Json(#[from] serde_json::Error),
}
