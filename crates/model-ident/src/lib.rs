//! Model identification and standardization.
//!
//! Given an arbitrary gridded [`Dataset`](esda_common::Dataset), this crate
//! works out which forecast model produced it, checks the dataset against
//! that model's contract and rewrites it into canonical DA naming:
//!
//! ```text
//! Dataset ─▶ IdentityResolver ─▶ ContractValidator ─▶ Standardizer ─▶ StandardizedDataset
//!              (metadata, then       (resolution,        (via the model's
//!               level fingerprint)    required vars,      ForecastInterface)
//!                                     NaN policy)
//! ```
//!
//! The [`Registry`] is built once and shared read-only; every other stage
//! is stateless and safe to run concurrently on distinct datasets.

pub mod error;
pub mod fingerprint;
pub mod identifier;
pub mod interfaces;
pub mod registry;
pub mod resolver;
pub mod spec;
pub mod standardizer;
pub mod validator;

pub use error::{IdentError, Result, Violation};
pub use fingerprint::{FingerprintMatcher, LEVEL_TOLERANCE};
pub use identifier::{Identifier, Identity, IdentifyOptions, PreparedState};
pub use interfaces::{ForecastInterface, InterfaceConfig, InterfaceFactory, ModelInterface};
pub use registry::{Registry, RegistryConfig, CRTM_GRID};
pub use resolver::{IdentityResolver, ResolutionMethod, ResolveOptions, Resolved};
pub use spec::{
    Conversion, DerivedQuantity, LevelFingerprint, ModelFamily, ModelSpec, OceanComponent,
    STANDARD_GRAVITY,
};
pub use standardizer::Standardizer;
pub use validator::{check_contract, ContractValidator, RESOLUTION_TOLERANCE};
