//! Per-family model adapters and the factory that builds them.
//!
//! Every registry entry names one adapter family. The set is closed: one
//! [`ModelInterface`] variant per [`ModelFamily`], all exposing the
//! [`ForecastInterface`] capability pair (`model_key`, `prepare_state`).

mod ai;
mod coupled;
mod global;
mod regional;
mod station;

pub use ai::AiFoundationInterface;
pub use coupled::CoupledInterface;
pub use global::GlobalInterface;
pub use regional::RegionalInterface;
pub use station::{StationInterface, STATION_DIM};

use crate::error::{IdentError, Result};
use crate::registry::Registry;
use crate::spec::{ModelFamily, ModelSpec};
use crate::standardizer::Standardizer;
use esda_common::{Dataset, StandardizedDataset};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Attribute written on every prepared state naming the resolved model.
pub const MODEL_ATTR: &str = "aiesda_model";

/// Attribute carrying the grid spacing the state was prepared for.
pub const RESOLUTION_ATTR: &str = "grid_resolution";

/// What a downstream caller needs from a model adapter.
pub trait ForecastInterface: Send + Sync {
    /// Registry key this adapter is bound to.
    fn model_key(&self) -> &str;

    fn family(&self) -> ModelFamily;

    /// Canonical, DA-ready form of a dataset already validated for this model.
    fn prepare_state(&self, raw: &Dataset) -> StandardizedDataset;
}

/// Optional per-adapter settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceConfig {
    /// Grid spacing (degrees) to record instead of the registry's
    #[serde(default)]
    pub resolution: Option<f64>,
}

/// Shared state of every adapter: the bound spec and its settings.
#[derive(Debug, Clone)]
pub(crate) struct AdapterCore {
    spec: Arc<ModelSpec>,
    config: InterfaceConfig,
}

impl AdapterCore {
    fn new(spec: Arc<ModelSpec>, config: InterfaceConfig) -> Self {
        Self { spec, config }
    }

    pub(crate) fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    pub(crate) fn key(&self) -> &str {
        &self.spec.key
    }

    pub(crate) fn resolution(&self) -> Option<f64> {
        self.config.resolution.or(self.spec.resolution)
    }

    /// Run the standardizer and hand back a dataset for family-specific touches.
    pub(crate) fn standardize(&self, raw: &Dataset) -> Dataset {
        Standardizer::new(&self.spec).standardize(raw).into_inner()
    }

    /// Stamp provenance attributes and freeze the result.
    pub(crate) fn finish(&self, mut dataset: Dataset) -> StandardizedDataset {
        dataset.attrs.insert(MODEL_ATTR, self.spec.key.clone());
        if let Some(resolution) = self.resolution() {
            dataset.attrs.insert(RESOLUTION_ATTR, resolution.to_string());
        }
        StandardizedDataset::new(dataset)
    }
}

/// The closed set of adapters, one variant per family.
#[derive(Debug, Clone)]
pub enum ModelInterface {
    AiFoundation(AiFoundationInterface),
    Coupled(CoupledInterface),
    Regional(RegionalInterface),
    Global(GlobalInterface),
    Station(StationInterface),
}

impl ModelInterface {
    fn inner(&self) -> &dyn ForecastInterface {
        match self {
            ModelInterface::AiFoundation(i) => i,
            ModelInterface::Coupled(i) => i,
            ModelInterface::Regional(i) => i,
            ModelInterface::Global(i) => i,
            ModelInterface::Station(i) => i,
        }
    }

    /// The spec this adapter is bound to.
    pub fn spec(&self) -> &ModelSpec {
        match self {
            ModelInterface::AiFoundation(i) => i.core.spec(),
            ModelInterface::Coupled(i) => i.core.spec(),
            ModelInterface::Regional(i) => i.core.spec(),
            ModelInterface::Global(i) => i.core.spec(),
            ModelInterface::Station(i) => i.core.spec(),
        }
    }
}

impl ForecastInterface for ModelInterface {
    fn model_key(&self) -> &str {
        self.inner().model_key()
    }

    fn family(&self) -> ModelFamily {
        self.inner().family()
    }

    fn prepare_state(&self, raw: &Dataset) -> StandardizedDataset {
        self.inner().prepare_state(raw)
    }
}

/// Builds adapters for registry keys.
///
/// Construction checks that every registry entry names a known adapter,
/// so misconfiguration surfaces once at startup instead of per dataset.
/// Creating an adapter performs no I/O.
#[derive(Debug, Clone)]
pub struct InterfaceFactory {
    registry: Arc<Registry>,
}

impl InterfaceFactory {
    pub fn new(registry: Arc<Registry>) -> Result<Self> {
        for spec in registry.iter() {
            spec.family()?;
        }
        Ok(Self { registry })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Adapter for `key`, optionally with adapter settings.
    pub fn create(&self, key: &str, config: Option<&InterfaceConfig>) -> Result<ModelInterface> {
        let spec = self
            .registry
            .get_shared(key)
            .ok_or_else(|| IdentError::UnknownModel(key.to_string()))?;
        let family = spec.family()?;
        let core = AdapterCore::new(spec, config.cloned().unwrap_or_default());

        debug!(model = %key, family = %family, "Created model interface");
        Ok(match family {
            ModelFamily::AiFoundation => ModelInterface::AiFoundation(AiFoundationInterface { core }),
            ModelFamily::CoupledDynamical => ModelInterface::Coupled(CoupledInterface { core }),
            ModelFamily::RegionalDynamical => ModelInterface::Regional(RegionalInterface { core }),
            ModelFamily::GlobalDynamical => ModelInterface::Global(GlobalInterface { core }),
            ModelFamily::PointObservation => ModelInterface::Station(StationInterface { core }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> InterfaceFactory {
        InterfaceFactory::new(Arc::new(Registry::builtin())).unwrap()
    }

    #[test]
    fn test_every_builtin_key_has_an_adapter() {
        let factory = factory();
        for key in factory.registry().keys() {
            let interface = factory.create(key, None).unwrap();
            assert_eq!(interface.model_key(), key);
        }
    }

    #[test]
    fn test_family_dispatch() {
        let factory = factory();
        assert!(matches!(factory.create("anemoi", None).unwrap(), ModelInterface::AiFoundation(_)));
        assert!(matches!(factory.create("bharat", None).unwrap(), ModelInterface::Coupled(_)));
        assert!(matches!(factory.create("mithuna", None).unwrap(), ModelInterface::Regional(_)));
        assert!(matches!(factory.create("ncum", None).unwrap(), ModelInterface::Global(_)));
        assert!(matches!(factory.create("monitobs", None).unwrap(), ModelInterface::Station(_)));
    }

    #[test]
    fn test_create_is_repeatable() {
        let factory = factory();
        let a = factory.create("gfs", None).unwrap();
        let b = factory.create("gfs", None).unwrap();
        let raw = Dataset::new().with_attr("source", "gfs");
        assert_eq!(a.prepare_state(&raw), b.prepare_state(&raw));
    }

    #[test]
    fn test_unknown_model() {
        assert!(matches!(
            factory().create("ecmwf", None),
            Err(IdentError::UnknownModel(_))
        ));
    }

    #[test]
    fn test_unknown_adapter_rejected_at_startup() {
        let mut spec = ModelSpec::new("odd", ModelFamily::GlobalDynamical);
        spec.adapter = "spectral".into();
        let registry = Registry::assemble(vec![spec], vec![]);
        assert!(matches!(
            InterfaceFactory::new(Arc::new(registry)),
            Err(IdentError::UnknownInterface { ref adapter, .. }) if adapter == "spectral"
        ));
    }

    #[test]
    fn test_config_resolution_recorded() {
        let config = InterfaceConfig {
            resolution: Some(0.5),
        };
        let interface = factory().create("anemoi", Some(&config)).unwrap();
        let state = interface.prepare_state(&Dataset::new());
        assert_eq!(state.attrs.get(RESOLUTION_ATTR), Some("0.5"));
        assert_eq!(state.attrs.get(MODEL_ATTR), Some("anemoi"));
    }
}
