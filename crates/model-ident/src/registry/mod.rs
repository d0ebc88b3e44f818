//! The model registry: an immutable catalogue of known model contracts.
//!
//! Built once at startup (from the builtin tables or YAML configuration)
//! and shared read-only, typically behind an `Arc`.

pub mod builtin;
pub mod loader;

use crate::error::{IdentError, Result};
use crate::spec::{LevelFingerprint, ModelSpec};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

pub use builtin::CRTM_GRID;
pub use loader::RegistryConfig;

/// Read-only catalogue of model specs and reference grids.
#[derive(Debug, Clone)]
pub struct Registry {
    models: Vec<Arc<ModelSpec>>,
    index: HashMap<String, usize>,
    reference_grids: Vec<LevelFingerprint>,
}

impl Registry {
    /// Build a registry, validating every entry.
    ///
    /// Fails on duplicate keys, inconsistent specs, unknown adapter names
    /// and malformed reference grids.
    pub fn new(models: Vec<ModelSpec>, reference_grids: Vec<LevelFingerprint>) -> Result<Self> {
        for spec in &models {
            spec.check()?;
        }
        for grid in &reference_grids {
            if grid.is_empty() || !grid.is_strictly_monotonic() {
                return Err(IdentError::InvalidConfig(format!(
                    "reference grid '{}' must be non-empty and strictly monotonic",
                    grid.name
                )));
            }
        }

        {
            let mut seen = HashSet::new();
            if let Some(dup) = models.iter().find(|m| !seen.insert(m.key.as_str())) {
                return Err(IdentError::InvalidConfig(format!(
                    "duplicate model key '{}'",
                    dup.key
                )));
            }
        }

        let registry = Self::assemble(models, reference_grids);

        debug!(
            models = registry.models.len(),
            reference_grids = registry.reference_grids.len(),
            "Built model registry"
        );
        Ok(registry)
    }

    /// The registry compiled into the crate.
    pub fn builtin() -> Self {
        Self::assemble(builtin::models(), builtin::reference_grids())
    }

    pub(crate) fn assemble(models: Vec<ModelSpec>, reference_grids: Vec<LevelFingerprint>) -> Self {
        let models: Vec<Arc<ModelSpec>> = models.into_iter().map(Arc::new).collect();
        let mut index = HashMap::with_capacity(models.len());
        for (i, spec) in models.iter().enumerate() {
            index.entry(spec.key.clone()).or_insert(i);
        }
        Self {
            models,
            index,
            reference_grids,
        }
    }

    pub fn get(&self, key: &str) -> Option<&ModelSpec> {
        self.index.get(key).map(|&i| self.models[i].as_ref())
    }

    /// Shared handle to a spec, for adapters that outlive the borrow.
    pub fn get_shared(&self, key: &str) -> Option<Arc<ModelSpec>> {
        self.index.get(key).map(|&i| Arc::clone(&self.models[i]))
    }

    /// Keys in enumeration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|m| m.key.as_str())
    }

    /// Specs in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.iter().map(|m| m.as_ref())
    }

    pub fn reference_grid(&self, name: &str) -> Option<&LevelFingerprint> {
        self.reference_grids.iter().find(|g| g.name == name)
    }

    pub fn reference_grids(&self) -> &[LevelFingerprint] {
        &self.reference_grids
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
