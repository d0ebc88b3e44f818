//! Synthetic dataset generators.
//!
//! Values follow simple deterministic patterns so tests can check exactly
//! what moved where.

use crate::fixtures::grid::GridSpec;
use esda_common::{Dataset, Variable};

/// `n` values starting at `start` with spacing `step`.
pub fn axis(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Horizontal pattern: `base + 0.01 * (row * nlon + col)`.
pub fn create_test_grid(grid: &GridSpec, base: f32) -> Vec<f32> {
    (0..grid.size()).map(|i| base + 0.01 * i as f32).collect()
}

/// Dataset with `lat`/`lon` coordinates and no variables.
pub fn gridded_dataset(grid: &GridSpec) -> Dataset {
    Dataset::new()
        .with_coord("lat", grid.lat())
        .with_coord("lon", grid.lon())
}

/// Add a `[lat, lon]` field.
pub fn add_surface_field(dataset: &mut Dataset, grid: &GridSpec, name: &str, base: f32) {
    let variable = Variable::new(
        vec!["lat", "lon"],
        vec![grid.nlat, grid.nlon],
        create_test_grid(grid, base),
    );
    dataset.variables.insert(name.to_string(), variable);
}

/// Add a `[axis, lat, lon]` field; each level is offset by its index.
pub fn add_profile_field(dataset: &mut Dataset, grid: &GridSpec, axis: &str, name: &str, base: f32) {
    let nlev = dataset.coord(axis).map(|c| c.len()).unwrap_or(1);
    let mut data = Vec::with_capacity(nlev * grid.size());
    for level in 0..nlev {
        data.extend(create_test_grid(grid, base + level as f32));
    }
    let variable = Variable::new(vec![axis, "lat", "lon"], vec![nlev, grid.nlat, grid.nlon], data);
    dataset.variables.insert(name.to_string(), variable);
}

/// A model-like dataset: horizontal grid, a vertical axis and fields.
///
/// Every name in `profile_vars` spans the vertical axis; every name in
/// `surface_vars` is 2-D.
pub fn model_dataset(
    grid: &GridSpec,
    vertical: Option<(&str, &[f64])>,
    profile_vars: &[&str],
    surface_vars: &[&str],
) -> Dataset {
    let mut dataset = gridded_dataset(grid);
    if let Some((axis, levels)) = vertical {
        dataset = dataset.with_coord(axis, levels.to_vec());
        for (i, name) in profile_vars.iter().enumerate() {
            add_profile_field(&mut dataset, grid, axis, name, 100.0 * (i + 1) as f32);
        }
    }
    for (i, name) in surface_vars.iter().enumerate() {
        add_surface_field(&mut dataset, grid, name, 10.0 * (i + 1) as f32);
    }
    dataset
}

/// Dataset of `n` stations with the given 1-D fields.
pub fn station_dataset(n: usize, vars: &[&str]) -> Dataset {
    let mut dataset = Dataset::new();
    for (i, name) in vars.iter().enumerate() {
        let data = (0..n).map(|s| (i * 100 + s) as f32).collect();
        dataset
            .variables
            .insert(name.to_string(), Variable::new(vec!["station"], vec![n], data));
    }
    dataset
}

/// Set one value of a variable to NaN. Returns false if it does not exist.
pub fn inject_nan(dataset: &mut Dataset, name: &str, index: usize) -> bool {
    match dataset.variables.get_mut(name) {
        Some(variable) if index < variable.data.len() => {
            variable.data[index] = f32::NAN;
            true
        }
        _ => false,
    }
}

/// Temperature (K) of a linear-in-log-pressure profile through
/// 288 K at 1000 hPa and 218 K at 100 hPa.
pub fn log_pressure_temperature(p_hpa: f64) -> f64 {
    288.0 + (218.0 - 288.0) * (p_hpa / 1000.0).ln() / (100.0_f64 / 1000.0).ln()
}
