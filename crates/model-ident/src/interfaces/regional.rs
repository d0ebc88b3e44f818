//! Adapter for limited-area dynamical models.

use super::{AdapterCore, ForecastInterface};
use crate::spec::ModelFamily;
use esda_common::{axes, Dataset, StandardizedDataset};

/// Regional models run on a bounded domain, often on a projected grid.
///
/// The `projection` attribute is carried through unchanged and the domain
/// bounds are recorded as `geospatial_*` attributes.
#[derive(Debug, Clone)]
pub struct RegionalInterface {
    pub(super) core: AdapterCore,
}

fn bounds(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn record_bounds(state: &mut Dataset, aliases: &[&str], prefix: &str) {
    let Some(axis) = state.find_axis(aliases) else {
        return;
    };
    let Some((lo, hi)) = state.coord(axis).and_then(|c| bounds(&c.values)) else {
        return;
    };
    state.attrs.insert(format!("{prefix}_min"), lo.to_string());
    state.attrs.insert(format!("{prefix}_max"), hi.to_string());
}

impl ForecastInterface for RegionalInterface {
    fn model_key(&self) -> &str {
        self.core.key()
    }

    fn family(&self) -> ModelFamily {
        ModelFamily::RegionalDynamical
    }

    fn prepare_state(&self, raw: &Dataset) -> StandardizedDataset {
        let mut state = self.core.standardize(raw);
        if let Some(projection) = raw.attrs.get("projection") {
            state.attrs.insert("projection", projection);
        }
        record_bounds(&mut state, axes::LONGITUDE_ALIASES, "geospatial_lon");
        record_bounds(&mut state, axes::LATITUDE_ALIASES, "geospatial_lat");
        self.core.finish(state)
    }
}
