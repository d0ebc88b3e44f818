//! Vertical interpolation of standardized profiles onto a reference grid.
//!
//! Profiles are interpolated linearly in `ln(p)`; targets outside the
//! source range are extrapolated from the nearest segment. The output
//! (GeoVaLs) carries the reference levels on the canonical `lev` axis.

use crate::error::{Result, VerificationError};
use esda_common::axes::CANONICAL_VERTICAL;
use esda_common::{Coordinate, Dataset, DatasetError, Variable};
use std::collections::BTreeMap;
use tracing::debug;

/// Interpolates onto a fixed set of target pressure levels (hPa).
#[derive(Debug, Clone)]
pub struct VerticalInterpolator {
    target: Vec<f64>,
    log_target: Vec<f64>,
}

fn log_pressure(levels: &[f64]) -> Result<Vec<f64>> {
    levels
        .iter()
        .map(|&p| {
            if p.is_finite() && p > 0.0 {
                Ok(p.ln())
            } else {
                Err(VerificationError::InvalidPressure(p))
            }
        })
        .collect()
}

/// Linear interpolation of `ys` at `x` over strictly ascending `xs`, extrapolating at the ends.
fn interp(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let n = xs.len();
    let upper = xs.partition_point(|&v| v < x).clamp(1, n - 1);
    let (x0, x1) = (xs[upper - 1], xs[upper]);
    let (y0, y1) = (ys[upper - 1], ys[upper]);
    if x1 == x0 {
        return y0;
    }
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

impl VerticalInterpolator {
    pub fn new(target_levels: Vec<f64>) -> Result<Self> {
        let log_target = log_pressure(&target_levels)?;
        Ok(Self {
            target: target_levels,
            log_target,
        })
    }

    pub fn target_levels(&self) -> &[f64] {
        &self.target
    }

    /// Interpolate one column given on `source_levels`.
    pub fn interpolate_column(&self, source_levels: &[f64], column: &[f64]) -> Result<Vec<f64>> {
        if source_levels.len() < 2 {
            return Err(VerificationError::TooFewLevels(source_levels.len()));
        }
        if column.len() != source_levels.len() {
            return Err(VerificationError::ColumnLength {
                levels: source_levels.len(),
                values: column.len(),
            });
        }
        let (xs, order) = ascending(&log_pressure(source_levels)?);
        let ys: Vec<f64> = order.iter().map(|&i| column[i]).collect();
        Ok(self.log_target.iter().map(|&x| interp(&xs, &ys, x)).collect())
    }

    /// Interpolate variable `name` along `axis`, keeping every other dimension.
    pub fn interpolate_variable(
        &self,
        name: &str,
        variable: &Variable,
        axis: &str,
        source_levels: &[f64],
    ) -> Result<Variable> {
        let Some(k) = variable.axis_index(axis) else {
            return Err(VerificationError::MissingVerticalAxis(axis.to_string()));
        };
        if source_levels.len() < 2 {
            return Err(VerificationError::TooFewLevels(source_levels.len()));
        }
        variable.check(name)?;
        let n = variable.shape[k];
        if n != source_levels.len() {
            return Err(DatasetError::AxisLengthMismatch {
                name: name.to_string(),
                dim: axis.to_string(),
                extent: n,
                coord_len: source_levels.len(),
            }
            .into());
        }
        let (xs, order) = ascending(&log_pressure(source_levels)?);

        let m = self.target.len();
        let outer: usize = variable.shape[..k].iter().product();
        let inner: usize = variable.shape[k + 1..].iter().product();

        let mut data = vec![0.0_f32; outer * m * inner];
        let mut ys = vec![0.0_f64; n];
        for o in 0..outer {
            for i in 0..inner {
                for (slot, &src) in ys.iter_mut().zip(&order) {
                    *slot = variable.data[(o * n + src) * inner + i] as f64;
                }
                for (t, &x) in self.log_target.iter().enumerate() {
                    data[(o * m + t) * inner + i] = interp(&xs, &ys, x) as f32;
                }
            }
        }

        let mut shape = variable.shape.clone();
        shape[k] = m;
        let mut out = Variable::new(variable.dims.clone(), shape, data);
        out.attrs = variable.attrs.clone();
        Ok(out)
    }

    /// GeoVaLs: every profile variable of a standardized dataset on the target levels.
    ///
    /// Variables that do not span `lev` are left out.
    pub fn generate_geovals(&self, dataset: &Dataset) -> Result<Dataset> {
        let source = dataset
            .coord(CANONICAL_VERTICAL)
            .ok_or_else(|| VerificationError::MissingVerticalAxis(CANONICAL_VERTICAL.to_string()))?;

        let mut geovals = Dataset {
            attrs: dataset.attrs.clone(),
            coords: BTreeMap::new(),
            variables: BTreeMap::new(),
        };
        let mut target = Coordinate::new(self.target.clone());
        target.attrs = source.attrs.clone();
        geovals.insert_coord(CANONICAL_VERTICAL, target);

        for (name, variable) in &dataset.variables {
            if !variable.spans(CANONICAL_VERTICAL) {
                debug!(variable = %name, "No vertical extent, not part of GeoVaLs");
                continue;
            }
            for dim in &variable.dims {
                if dim != CANONICAL_VERTICAL && !geovals.has_coord(dim) {
                    if let Some(coord) = dataset.coord(dim) {
                        geovals.insert_coord(dim.clone(), coord.clone());
                    }
                }
            }
            let interpolated = self.interpolate_variable(name, variable, CANONICAL_VERTICAL, &source.values)?;
            geovals.insert_variable(name.clone(), interpolated)?;
        }

        debug!(
            variables = geovals.variables.len(),
            source_levels = source.len(),
            target_levels = self.target.len(),
            "Generated GeoVaLs"
        );
        Ok(geovals)
    }
}

/// Sort log-pressures ascending, returning them with their original indices.
fn ascending(xs: &[f64]) -> (Vec<f64>, Vec<usize>) {
    let mut order: Vec<usize> = (0..xs.len()).collect();
    order.sort_by(|&a, &b| xs[a].total_cmp(&xs[b]));
    (order.iter().map(|&i| xs[i]).collect(), order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{assert_all_approx_eq, assert_approx_eq, log_pressure_temperature};

    #[test]
    fn test_log_linear_profile_is_exact() {
        let source = [1000.0, 850.0, 500.0, 250.0, 100.0];
        let column: Vec<f64> = source.iter().map(|&p| log_pressure_temperature(p)).collect();
        let target = vec![925.0, 700.0, 300.0, 150.0];

        let interp = VerticalInterpolator::new(target.clone()).unwrap();
        let out = interp.interpolate_column(&source, &column).unwrap();
        let expected: Vec<f64> = target.iter().map(|&p| log_pressure_temperature(p)).collect();
        assert_all_approx_eq!(out, expected, 1e-9);
    }

    #[test]
    fn test_extrapolates_beyond_source_range() {
        let source = [850.0, 500.0];
        let column: Vec<f64> = source.iter().map(|&p| log_pressure_temperature(p)).collect();
        let interp = VerticalInterpolator::new(vec![1000.0, 100.0]).unwrap();
        let out = interp.interpolate_column(&source, &column).unwrap();
        assert_approx_eq!(out[0], 288.0, 1e-9);
        assert_approx_eq!(out[1], 218.0, 1e-9);
    }

    #[test]
    fn test_source_order_does_not_matter() {
        let interp = VerticalInterpolator::new(vec![700.0]).unwrap();
        let a = interp.interpolate_column(&[1000.0, 500.0], &[288.0, 250.0]).unwrap();
        let b = interp.interpolate_column(&[500.0, 1000.0], &[250.0, 288.0]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_levels() {
        assert!(matches!(
            VerticalInterpolator::new(vec![100.0, 0.0]),
            Err(VerificationError::InvalidPressure(p)) if p == 0.0
        ));
        let interp = VerticalInterpolator::new(vec![500.0]).unwrap();
        assert!(matches!(
            interp.interpolate_column(&[500.0], &[1.0]),
            Err(VerificationError::TooFewLevels(1))
        ));
    }

    #[test]
    fn test_interpolate_middle_axis() {
        // [time=2, lev=2, x=3]
        let data: Vec<f32> = vec![
            0.0, 1.0, 2.0, 10.0, 11.0, 12.0, //
            20.0, 21.0, 22.0, 30.0, 31.0, 32.0,
        ];
        let var = Variable::new(vec!["time", "lev", "x"], vec![2, 2, 3], data);
        let mid = (1000.0_f64 * 100.0).sqrt();
        let interp = VerticalInterpolator::new(vec![mid]).unwrap();

        let out = interp.interpolate_variable("t", &var, "lev", &[1000.0, 100.0]).unwrap();
        assert_eq!(out.shape, vec![2, 1, 3]);
        assert_all_approx_eq!(out.data, vec![5.0_f32, 6.0, 7.0, 25.0, 26.0, 27.0], 1e-4);
    }

    #[test]
    fn test_malformed_variables_are_errors() {
        let interp = VerticalInterpolator::new(vec![500.0]).unwrap();

        // dims and shape disagree in rank
        let ragged = Variable::new(vec!["lev", "x"], vec![2], vec![1.0, 2.0]);
        assert!(matches!(
            interp.interpolate_variable("t", &ragged, "lev", &[1000.0, 100.0]),
            Err(VerificationError::Dataset(DatasetError::RankMismatch { .. }))
        ));

        // fewer values than the shape needs
        let short = Variable::new(vec!["lev", "x"], vec![2, 3], vec![1.0; 4]);
        assert!(matches!(
            interp.interpolate_variable("t", &short, "lev", &[1000.0, 100.0]),
            Err(VerificationError::Dataset(DatasetError::ShapeMismatch { .. }))
        ));

        // vertical extent differs from the source levels
        let tall = Variable::new(vec!["lev"], vec![3], vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            interp.interpolate_variable("t", &tall, "lev", &[1000.0, 100.0]),
            Err(VerificationError::Dataset(DatasetError::AxisLengthMismatch { extent: 3, coord_len: 2, .. }))
        ));

        assert!(matches!(
            interp.interpolate_column(&[1000.0, 100.0], &[1.0]),
            Err(VerificationError::ColumnLength { levels: 2, values: 1 })
        ));
    }

    #[test]
    fn test_geovals_of_unchecked_dataset_is_error() {
        let ds = Dataset::new()
            .with_coord("lev", vec![1000.0, 500.0])
            .with_variable("t", Variable::new(vec!["lev"], vec![3], vec![280.0, 260.0, 240.0]));
        let interp = VerticalInterpolator::new(vec![700.0]).unwrap();
        assert!(matches!(
            interp.generate_geovals(&ds),
            Err(VerificationError::Dataset(_))
        ));
    }
}
