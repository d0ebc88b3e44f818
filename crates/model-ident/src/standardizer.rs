//! Standardization: rewrite a validated dataset into canonical naming.
//!
//! Per component (atmosphere, and ocean for coupled models):
//! 1. rename native variables to canonical names;
//! 2. rename the first recognised vertical alias to the canonical axis;
//! 3. substitute the reference level values when the axis length matches.
//!
//! Coupled models are split into atmosphere and ocean parts, standardized
//! independently and merged again. Derived quantities are added last.
//! The input dataset is never modified.

use crate::spec::{DerivedQuantity, LevelFingerprint, ModelSpec, OceanComponent};
use esda_common::{Dataset, StandardizedDataset, Variable};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Naming rules for one component of a model.
struct Component<'s> {
    name: &'static str,
    renames: BTreeMap<&'s str, &'s str>,
    aliases: &'s [String],
    axis: &'s str,
    levels: Option<&'s LevelFingerprint>,
}

/// Standardizer bound to one model spec.
pub struct Standardizer<'s> {
    spec: &'s ModelSpec,
}

impl<'s> Standardizer<'s> {
    pub fn new(spec: &'s ModelSpec) -> Self {
        Self { spec }
    }

    /// Produce the canonical form of `raw`.
    ///
    /// Callers validate first; variables missing from the dataset are
    /// simply not renamed.
    pub fn standardize(&self, raw: &Dataset) -> StandardizedDataset {
        let atmosphere = Component {
            name: "atmosphere",
            renames: self.spec.native_to_canonical(),
            aliases: &self.spec.vertical_aliases,
            axis: &self.spec.vertical_axis,
            levels: self.spec.levels.as_ref(),
        };

        let mut dataset = match &self.spec.ocean {
            None => {
                let mut dataset = raw.clone();
                self.standardize_component(&mut dataset, &atmosphere);
                dataset
            }
            Some(ocean) => {
                let (mut atmos, mut sea) = split_ocean(raw, ocean);
                self.standardize_component(&mut atmos, &atmosphere);
                self.standardize_component(
                    &mut sea,
                    &Component {
                        name: "ocean",
                        renames: ocean.native_to_canonical(),
                        aliases: &ocean.vertical_aliases,
                        axis: &ocean.vertical_axis,
                        levels: ocean.levels.as_ref(),
                    },
                );
                atmos.merge(sea);
                atmos
            }
        };

        apply_derived(&mut dataset, &self.spec.derived, &self.spec.key);
        StandardizedDataset::new(dataset)
    }

    fn standardize_component(&self, dataset: &mut Dataset, component: &Component<'_>) {
        rename_variables(dataset, &component.renames, &self.spec.key);

        if let Some(alias) = dataset.find_axis_owned(component.aliases) {
            if alias != component.axis && !dataset.rename_dimension(alias, component.axis) {
                warn!(
                    model = %self.spec.key,
                    component = component.name,
                    from = %alias,
                    to = %component.axis,
                    "Vertical axis not renamed: canonical axis already present"
                );
            }
        }

        if let Some(levels) = component.levels {
            overwrite_levels(dataset, component.axis, levels, &self.spec.key);
        }
    }
}

/// Rename native variables to canonical names.
///
/// All renamed variables are taken out before any is reinserted, so a
/// canonical name that is also another variable's native name cannot
/// shadow it.
fn rename_variables(dataset: &mut Dataset, renames: &BTreeMap<&str, &str>, model: &str) {
    let moved: Vec<(&str, &str, Variable)> = renames
        .iter()
        .filter(|(native, canonical)| native != canonical)
        .filter_map(|(&native, &canonical)| {
            dataset
                .remove_variable(native)
                .map(|variable| (native, canonical, variable))
        })
        .collect();

    for (native, canonical, variable) in moved {
        if dataset.has_variable(canonical) {
            warn!(
                model = %model,
                native = %native,
                canonical = %canonical,
                "Canonical name already present; keeping native variable"
            );
            dataset.variables.insert(native.to_string(), variable);
        } else {
            debug!(model = %model, native = %native, canonical = %canonical, "Renamed variable");
            dataset.variables.insert(canonical.to_string(), variable);
        }
    }
}

/// Substitute reference level values on an axis of matching length.
///
/// Each value is replaced by the reference value of the same rank, so an
/// axis stored top-down stays top-down.
fn overwrite_levels(dataset: &mut Dataset, axis: &str, levels: &LevelFingerprint, model: &str) {
    let Some(coord) = dataset.coord(axis) else {
        return;
    };
    if coord.len() != levels.len() {
        warn!(
            model = %model,
            axis = %axis,
            expected = levels.len(),
            observed = coord.len(),
            "Vertical level count differs from reference; keeping dataset levels"
        );
        return;
    }

    let mut order: Vec<usize> = (0..coord.len()).collect();
    order.sort_by(|&a, &b| coord.values[a].total_cmp(&coord.values[b]));
    let mut reference = levels.values.clone();
    reference.sort_by(|a, b| a.total_cmp(b));

    let mut values = vec![0.0; reference.len()];
    for (rank, &index) in order.iter().enumerate() {
        values[index] = reference[rank];
    }

    debug!(model = %model, axis = %axis, levels = %levels.name, "Substituted reference levels");
    dataset.set_coord_values(axis, values);
}

/// Split a coupled dataset into its atmosphere and ocean parts.
///
/// The atmosphere keeps every non-depth coordinate; the ocean gets its
/// depth axes plus whatever coordinates its variables span.
fn split_ocean(raw: &Dataset, ocean: &OceanComponent) -> (Dataset, Dataset) {
    let mut atmos = Dataset {
        attrs: raw.attrs.clone(),
        ..Dataset::default()
    };
    let mut sea = Dataset {
        attrs: raw.attrs.clone(),
        ..Dataset::default()
    };

    for (name, variable) in &raw.variables {
        let is_ocean =
            ocean.owns_variable(name) || variable.dims.iter().any(|d| ocean.owns_dimension(d));
        let target = if is_ocean { &mut sea } else { &mut atmos };
        target.variables.insert(name.clone(), variable.clone());
    }

    for (name, coord) in &raw.coords {
        let used_by_ocean = sea.variables.values().any(|v| v.spans(name));
        if ocean.owns_dimension(name) || used_by_ocean {
            sea.insert_coord(name.clone(), coord.clone());
        }
        if !ocean.owns_dimension(name) {
            atmos.insert_coord(name.clone(), coord.clone());
        }
    }

    (atmos, sea)
}

/// Add derived canonical fields whose source is present and target absent.
fn apply_derived(dataset: &mut Dataset, derived: &[DerivedQuantity], model: &str) {
    for quantity in derived {
        if dataset.has_variable(&quantity.target) {
            continue;
        }
        let Some(source) = dataset.variable(&quantity.source) else {
            continue;
        };

        let mut variable = source.map_values(|v| quantity.conversion.apply(v));
        if let Some(units) = &quantity.units {
            variable.attrs.insert("units", units.clone());
        }
        debug!(
            model = %model,
            source = %quantity.source,
            target = %quantity.target,
            "Derived quantity"
        );
        dataset.variables.insert(quantity.target.clone(), variable);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::spec::{Conversion, ModelFamily, STANDARD_GRAVITY};

    fn toy_spec() -> ModelSpec {
        let mut spec = ModelSpec::new("toy", ModelFamily::GlobalDynamical);
        spec.levels = Some(LevelFingerprint::new("three", vec![1000.0, 850.0, 500.0]));
        spec.mapping.insert("air_temperature".into(), "t".into());
        spec.mapping.insert("geopotential".into(), "z".into());
        spec.derived = vec![DerivedQuantity {
            target: "geopotential_height".into(),
            source: "geopotential".into(),
            conversion: Conversion::DivideByGravity,
            units: Some("m".into()),
        }];
        spec
    }

    fn profile(name_dim: &str, len: usize, value: f32) -> Variable {
        Variable::new(vec![name_dim], vec![len], vec![value; len])
    }

    #[test]
    fn test_rename_and_axis() {
        let spec = toy_spec();
        let raw = Dataset::new()
            .with_coord("plev", vec![1000.0002, 849.9998, 500.0001])
            .with_variable("t", profile("plev", 3, 280.0))
            .with_variable("other", profile("plev", 3, 1.0));

        let out = Standardizer::new(&spec).standardize(&raw);
        assert!(out.has_variable("air_temperature"));
        assert!(out.has_variable("other"));
        assert!(!out.has_variable("t"));
        assert_eq!(out.coord("lev").unwrap().values, vec![1000.0, 850.0, 500.0]);
        assert_eq!(out.variable("air_temperature").unwrap().dims, vec!["lev"]);

        // input untouched
        assert!(raw.has_variable("t"));
        assert!(raw.has_coord("plev"));
    }

    #[test]
    fn test_level_overwrite_preserves_orientation() {
        let spec = toy_spec();
        let raw = Dataset::new().with_coord("level", vec![500.0004, 850.0, 999.9996]);
        let out = Standardizer::new(&spec).standardize(&raw);
        assert_eq!(out.coord("lev").unwrap().values, vec![500.0, 850.0, 1000.0]);
    }

    #[test]
    fn test_level_count_mismatch_keeps_values() {
        let spec = toy_spec();
        let raw = Dataset::new().with_coord("level", vec![1000.5, 700.0]);
        let out = Standardizer::new(&spec).standardize(&raw);
        assert_eq!(out.coord("lev").unwrap().values, vec![1000.5, 700.0]);
    }

    #[test]
    fn test_idempotent() {
        let spec = toy_spec();
        let raw = Dataset::new()
            .with_coord("level", vec![1000.0, 850.0, 500.0])
            .with_variable("t", profile("level", 3, 280.0))
            .with_variable("z", profile("level", 3, 9.80665 * 1500.0));

        let once = Standardizer::new(&spec).standardize(&raw);
        let twice = Standardizer::new(&spec).standardize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_derived_geopotential_height() {
        let spec = toy_spec();
        let raw = Dataset::new()
            .with_coord("lev", vec![1000.0, 850.0, 500.0])
            .with_variable("z", profile("lev", 3, (STANDARD_GRAVITY * 1500.0) as f32));

        let out = Standardizer::new(&spec).standardize(&raw);
        let height = out.variable("geopotential_height").unwrap();
        assert!((height.data[0] - 1500.0).abs() < 1e-2);
        assert_eq!(height.attrs.get("units"), Some("m"));
        assert!(out.has_variable("geopotential"));
    }

    #[test]
    fn test_derived_does_not_overwrite() {
        let spec = toy_spec();
        let raw = Dataset::new()
            .with_variable("z", profile("lev", 3, 1.0))
            .with_variable("geopotential_height", profile("lev", 3, 42.0));
        let out = Standardizer::new(&spec).standardize(&raw);
        assert_eq!(out.variable("geopotential_height").unwrap().data, vec![42.0; 3]);
    }

    #[test]
    fn test_rename_collision_keeps_native() {
        let spec = toy_spec();
        let raw = Dataset::new()
            .with_variable("t", profile("x", 1, 1.0))
            .with_variable("air_temperature", profile("x", 1, 2.0));
        let out = Standardizer::new(&spec).standardize(&raw);
        assert_eq!(out.variable("air_temperature").unwrap().data, vec![2.0]);
        assert_eq!(out.variable("t").unwrap().data, vec![1.0]);
    }

    #[test]
    fn test_coupled_split_and_merge() {
        let registry = Registry::builtin();
        let spec = registry.get("bharat").unwrap();
        let atmos_levels = spec.levels.as_ref().unwrap().values.clone();
        let depth_levels = spec.ocean.as_ref().unwrap().levels.as_ref().unwrap().values.clone();

        let raw = Dataset::new()
            .with_coord("lon", vec![0.0, 0.125])
            .with_coord("level", atmos_levels.clone())
            .with_coord("depth", depth_levels.iter().map(|d| d + 0.0004).collect())
            .with_variable("ta", profile("level", atmos_levels.len(), 250.0))
            .with_variable("zg", profile("level", atmos_levels.len(), 1000.0))
            .with_variable("thetao", profile("depth", depth_levels.len(), 15.0))
            .with_variable("zos", Variable::new(vec!["lon"], vec![2], vec![0.1, 0.2]));

        let out = Standardizer::new(spec).standardize(&raw);

        assert!(out.has_coord("lev"));
        assert!(out.has_coord("ocean_depth"));
        assert!(!out.has_coord("depth"));
        assert!(!out.has_coord("level"));
        assert!(out.has_coord("lon"));
        assert_eq!(out.coord("ocean_depth").unwrap().values, depth_levels);

        assert_eq!(out.variable("air_temperature").unwrap().dims, vec!["lev"]);
        assert_eq!(
            out.variable("sea_water_potential_temperature").unwrap().dims,
            vec!["ocean_depth"]
        );
        assert!(out.has_variable("sea_surface_height_above_geoid"));
        assert!(out.has_variable("geopotential"));
        out.check().unwrap();
    }
}
