//! Adapter for global learned forecast models.

use super::{AdapterCore, ForecastInterface};
use crate::spec::ModelFamily;
use esda_common::{Dataset, StandardizedDataset};

/// Learned global models (37- and 13-level variants).
///
/// These emit one self-consistent global state per step, so preparation is
/// the plain rename and level substitution.
#[derive(Debug, Clone)]
pub struct AiFoundationInterface {
    pub(super) core: AdapterCore,
}

impl ForecastInterface for AiFoundationInterface {
    fn model_key(&self) -> &str {
        self.core.key()
    }

    fn family(&self) -> ModelFamily {
        ModelFamily::AiFoundation
    }

    fn prepare_state(&self, raw: &Dataset) -> StandardizedDataset {
        self.core.finish(self.core.standardize(raw))
    }
}

#[cfg(test)]
mod tests {
    use crate::interfaces::{ForecastInterface, InterfaceFactory};
    use crate::registry::Registry;
    use esda_common::{Dataset, Variable};
    use std::sync::Arc;

    #[test]
    fn test_anemoi_surface_names() {
        let factory = InterfaceFactory::new(Arc::new(Registry::builtin())).unwrap();
        let anemoi = factory.create("anemoi", None).unwrap();

        let raw = Dataset::new()
            .with_variable("2t", Variable::new(vec!["lon"], vec![1], vec![288.0]))
            .with_variable("u10", Variable::new(vec!["lon"], vec![1], vec![3.0]));
        let state = anemoi.prepare_state(&raw);

        assert!(state.has_variable("air_temperature"));
        assert!(state.has_variable("eastward_wind"));
        assert!(!state.has_variable("2t"));
    }
}
