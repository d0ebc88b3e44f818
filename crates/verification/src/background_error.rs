//! Background error statistics from a history of forecast errors.
//!
//! The spread of `forecast - truth` over the time dimension gives a
//! per-point estimate of the background error standard deviation, the
//! diagonal of the B matrix used by the variational analysis.

use crate::error::{Result, VerificationError};
use esda_common::{Dataset, Variable};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Dimension the error history runs along.
pub const TIME_DIM: &str = "time";

/// Population standard deviation over the non-NaN values; NaN when none remain.
fn std_dev(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, sum_sq, count) = values
        .filter(|v| !v.is_nan())
        .fold((0.0_f64, 0.0_f64, 0usize), |(s, s2, n), v| (s + v, s2 + v * v, n + 1));
    if count == 0 {
        return f64::NAN;
    }
    let n = count as f64;
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0).sqrt()
}

/// Per-point standard deviation of `forecast - truth` along `time`.
pub fn error_std_dev(forecast: &Dataset, truth: &Dataset) -> Result<Dataset> {
    error_std_dev_along(forecast, truth, TIME_DIM)
}

/// Per-point standard deviation of `forecast - truth` along `dim`.
///
/// Only variables present in both datasets with the same shape and
/// spanning `dim` are kept; the output drops `dim` from each of them.
pub fn error_std_dev_along(forecast: &Dataset, truth: &Dataset, dim: &str) -> Result<Dataset> {
    let pairs: Vec<(&String, &Variable, &Variable)> = forecast
        .variables
        .iter()
        .filter_map(|(name, fc)| {
            let Some(tr) = truth.variable(name) else {
                debug!(variable = %name, "No truth counterpart, skipping");
                return None;
            };
            if !fc.spans(dim) {
                debug!(variable = %name, dim = %dim, "Variable has no time history, skipping");
                return None;
            }
            if fc.shape != tr.shape || fc.dims != tr.dims {
                warn!(
                    variable = %name,
                    forecast = ?fc.shape,
                    truth = ?tr.shape,
                    "Forecast and truth disagree in layout, skipping"
                );
                return None;
            }
            Some((name, fc, tr))
        })
        .collect();

    if pairs.is_empty() {
        return Err(VerificationError::MissingDimension(dim.to_string()));
    }

    let variables: BTreeMap<String, Variable> = pairs
        .par_iter()
        .map(|(name, fc, tr)| Ok(((*name).clone(), spread(name, fc, tr, dim)?)))
        .collect::<Result<_>>()?;

    let mut out = Dataset {
        attrs: forecast.attrs.clone(),
        coords: forecast.coords.clone(),
        variables,
    };
    out.coords.remove(dim);

    info!(variables = out.variables.len(), dim = %dim, "Computed background error statistics");
    Ok(out)
}

fn spread(name: &str, forecast: &Variable, truth: &Variable, dim: &str) -> Result<Variable> {
    forecast.check(name)?;
    truth.check(name)?;
    let Some(k) = forecast.axis_index(dim) else {
        return Err(VerificationError::MissingDimension(dim.to_string()));
    };

    let steps = forecast.shape[k];
    let outer: usize = forecast.shape[..k].iter().product();
    let inner: usize = forecast.shape[k + 1..].iter().product();

    let mut data = Vec::with_capacity(outer * inner);
    for o in 0..outer {
        for i in 0..inner {
            let errors = (0..steps).map(|t| {
                let at = (o * steps + t) * inner + i;
                forecast.data[at] as f64 - truth.data[at] as f64
            });
            data.push(std_dev(errors) as f32);
        }
    }

    let mut dims = forecast.dims.clone();
    dims.remove(k);
    let mut shape = forecast.shape.clone();
    shape.remove(k);
    Ok(Variable::new(dims, shape, data))
}
