//! Per-cycle verification of data assimilation output.
//!
//! - [`increment`]: analysis minus background and its summary statistics
//! - [`background_error`]: spread of historical forecast errors over time
//! - [`sensitivity`]: response of the model to a perturbed initial state
//! - [`temporal`]: cycle-to-cycle jump against the previous forecast
//! - [`report`]: the experiment report card written as CSV
//! - [`interpolate`]: log-pressure interpolation of standardized profiles
//!   onto a reference level grid (GeoVaLs)

pub mod background_error;
pub mod error;
pub mod increment;
pub mod interpolate;
pub mod report;
pub mod sensitivity;
pub mod temporal;

pub use background_error::{error_std_dev, error_std_dev_along, TIME_DIM};
pub use error::{Result, VerificationError};
pub use increment::{increment, increment_stats, summarize, VariableStats};
pub use interpolate::VerticalInterpolator;
pub use report::{CycleMetrics, ReportCard};
pub use sensitivity::{perturb, sensitivity, DEFAULT_EPSILON, EPSILON_ATTR};
pub use temporal::{check_temporal_consistency, TemporalAlert, TemporalCheck, DEFAULT_JUMP_THRESHOLD};
