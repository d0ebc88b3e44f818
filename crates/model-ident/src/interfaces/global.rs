//! Adapter for global atmosphere-only dynamical models.

use super::{AdapterCore, ForecastInterface};
use crate::spec::ModelFamily;
use esda_common::{Dataset, StandardizedDataset};

#[derive(Debug, Clone)]
pub struct GlobalInterface {
    pub(super) core: AdapterCore,
}

impl ForecastInterface for GlobalInterface {
    fn model_key(&self) -> &str {
        self.core.key()
    }

    fn family(&self) -> ModelFamily {
        ModelFamily::GlobalDynamical
    }

    fn prepare_state(&self, raw: &Dataset) -> StandardizedDataset {
        let mut state = self.core.standardize(raw);
        state.attrs.insert("grid_type", "regular_ll");
        self.core.finish(state)
    }
}

#[cfg(test)]
mod tests {
    use crate::interfaces::{ForecastInterface, InterfaceFactory};
    use crate::registry::Registry;
    use esda_common::{Dataset, Variable};
    use std::sync::Arc;

    #[test]
    fn test_gfs_isobaric_axis_and_derived_geopotential() {
        let factory = InterfaceFactory::new(Arc::new(Registry::builtin())).unwrap();
        let gfs = factory.create("gfs", None).unwrap();

        let raw = Dataset::new()
            .with_coord("isobaricInhPa", vec![1000.0, 500.0])
            .with_variable("gh", Variable::new(vec!["isobaricInhPa"], vec![2], vec![100.0, 5500.0]));
        let state = gfs.prepare_state(&raw);

        assert!(state.has_coord("lev"));
        // 2 levels against a 41-level reference: values kept
        assert_eq!(state.coord("lev").unwrap().values, vec![1000.0, 500.0]);
        assert!(state.has_variable("geopotential_height"));
        let z = state.variable("geopotential").unwrap();
        assert!((z.data[1] - 5500.0 * 9.80665).abs() < 1.0);
        assert_eq!(state.attrs.get("grid_type"), Some("regular_ll"));
    }
}
