//! AIESDA cycle runner.
//!
//! Orchestrates one data assimilation cycle around the model
//! identification core: the incoming forecast is identified, validated and
//! standardized into the background, handed to the DA system, verified
//! against the background and the previous cycle, and used to start the
//! next forecast. A sensitivity test can rerun the forecast from a
//! perturbed analysis.

pub mod collaborators;
pub mod config;
pub mod cycle;
pub mod paths;

pub use collaborators::{AssimilationRequest, DaBridge, ExternalCommand, ForecastRuntime};
pub use config::{load_cycle_config, parse_cycle_config, CycleConfig, SensitivityConfig};
pub use cycle::{CycleOutcome, CycleRunner, PrepareOutcome, SensitivityOutcome, VerifyOutcome};
pub use paths::{home_from_env, CyclePaths, CycleTime};
