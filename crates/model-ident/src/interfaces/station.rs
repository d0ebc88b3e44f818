//! Adapter for point-based observation sources.

use super::{AdapterCore, ForecastInterface};
use crate::spec::ModelFamily;
use esda_common::{Dataset, StandardizedDataset};

/// Dimension indexing stations in point datasets.
pub const STATION_DIM: &str = "station";

/// Station sources have no grid and no vertical levels; the prepared state
/// is tagged as CF point data with its station count.
#[derive(Debug, Clone)]
pub struct StationInterface {
    pub(super) core: AdapterCore,
}

impl ForecastInterface for StationInterface {
    fn model_key(&self) -> &str {
        self.core.key()
    }

    fn family(&self) -> ModelFamily {
        ModelFamily::PointObservation
    }

    fn prepare_state(&self, raw: &Dataset) -> StandardizedDataset {
        let mut state = self.core.standardize(raw);
        state.attrs.insert("featureType", "point");
        let stations = state
            .variables
            .values()
            .find_map(|v| v.extent(STATION_DIM));
        if let Some(count) = stations {
            state.attrs.insert("station_count", count.to_string());
        }
        self.core.finish(state)
    }
}

#[cfg(test)]
mod tests {
    use crate::interfaces::{ForecastInterface, InterfaceFactory, RESOLUTION_ATTR};
    use crate::registry::Registry;
    use esda_common::{Dataset, Variable};
    use std::sync::Arc;

    #[test]
    fn test_station_state() {
        let factory = InterfaceFactory::new(Arc::new(Registry::builtin())).unwrap();
        let obs = factory.create("monitobs", None).unwrap();

        let raw = Dataset::new()
            .with_variable("tair", Variable::new(vec!["station"], vec![3], vec![290.0, f32::NAN, 291.0]))
            .with_variable("pres", Variable::new(vec!["station"], vec![3], vec![1.0e5; 3]));
        let state = obs.prepare_state(&raw);

        assert!(state.has_variable("air_temperature"));
        assert!(state.has_variable("surface_pressure"));
        assert_eq!(state.attrs.get("station_count"), Some("3"));
        assert_eq!(state.attrs.get("featureType"), Some("point"));
        assert!(state.attrs.get(RESOLUTION_ATTR).is_none());
    }

    #[test]
    fn test_station_state_with_undeclared_extent() {
        let factory = InterfaceFactory::new(Arc::new(Registry::builtin())).unwrap();
        let obs = factory.create("monitobs", None).unwrap();

        let raw = Dataset::new().with_variable(
            "tair",
            Variable::new(vec!["time", "station"], vec![2], vec![290.0, 291.0]),
        );
        let state = obs.prepare_state(&raw);

        assert!(state.has_variable("air_temperature"));
        assert!(state.attrs.get("station_count").is_none());
    }
}
