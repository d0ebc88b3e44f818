//! Common types shared across the AIESDA crates.
//!
//! The central type is [`Dataset`]: an in-memory gridded artifact made of
//! named variables, named 1-D coordinate axes and an ordered list of
//! free-form attributes. It is the handle exchanged between the forecast
//! runtime, the model identification core and the DA bridge.

pub mod attrs;
pub mod axes;
pub mod dataset;
pub mod error;
pub mod io;

pub use attrs::Attributes;
pub use dataset::{Coordinate, Dataset, StandardizedDataset, Variable};
pub use error::{DatasetError, DatasetResult};
