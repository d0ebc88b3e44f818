//! Adapter for coupled atmosphere-ocean dynamical models.

use super::{AdapterCore, ForecastInterface};
use crate::spec::ModelFamily;
use esda_common::{Dataset, StandardizedDataset};

/// Coupled models carry separate atmosphere and ocean vertical axes; the
/// standardizer splits, standardizes and merges the two components.
#[derive(Debug, Clone)]
pub struct CoupledInterface {
    pub(super) core: AdapterCore,
}

impl CoupledInterface {
    /// Canonical name of the ocean depth axis, if the model has an ocean part.
    pub fn ocean_axis(&self) -> Option<&str> {
        self.core.spec().ocean.as_ref().map(|o| o.vertical_axis.as_str())
    }
}

impl ForecastInterface for CoupledInterface {
    fn model_key(&self) -> &str {
        self.core.key()
    }

    fn family(&self) -> ModelFamily {
        ModelFamily::CoupledDynamical
    }

    fn prepare_state(&self, raw: &Dataset) -> StandardizedDataset {
        let mut state = self.core.standardize(raw);
        let components = if self.ocean_axis().is_some() {
            "atmosphere ocean"
        } else {
            "atmosphere"
        };
        state.attrs.insert("coupled_components", components);
        self.core.finish(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::{InterfaceFactory, ModelInterface};
    use crate::registry::Registry;
    use std::sync::Arc;

    #[test]
    fn test_ocean_axis() {
        let factory = InterfaceFactory::new(Arc::new(Registry::builtin())).unwrap();
        let ModelInterface::Coupled(bharat) = factory.create("bharat", None).unwrap() else {
            panic!("bharat should use the coupled adapter");
        };
        assert_eq!(bharat.ocean_axis(), Some("ocean_depth"));

        let state = bharat.prepare_state(&Dataset::new());
        assert_eq!(state.attrs.get("coupled_components"), Some("atmosphere ocean"));
        assert_eq!(state.attrs.get("grid_resolution"), Some("0.125"));
    }
}
