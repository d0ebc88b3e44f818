//! Analysis increments.

use esda_common::{Dataset, Variable};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Summary of one field, NaN values excluded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariableStats {
    /// Mean value (the bias, for an increment)
    pub mean: f64,
    /// Root mean square
    pub rms: f64,
    /// Number of finite values summarized
    pub count: usize,
}

/// Mean, RMS and count over the non-NaN values. Empty input gives NaN statistics.
pub fn summarize(values: &[f32]) -> VariableStats {
    let (sum, sum_sq, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0_f64, 0.0_f64, 0usize), |(s, s2, n), &v| {
            let v = v as f64;
            (s + v, s2 + v * v, n + 1)
        });

    if count == 0 {
        return VariableStats {
            mean: f64::NAN,
            rms: f64::NAN,
            count: 0,
        };
    }
    let n = count as f64;
    VariableStats {
        mean: sum / n,
        rms: (sum_sq / n).sqrt(),
        count,
    }
}

/// `analysis - background` for every variable present in both with the same shape.
///
/// Coordinates and attributes come from the analysis.
pub fn increment(analysis: &Dataset, background: &Dataset) -> Dataset {
    let mut out = Dataset {
        attrs: analysis.attrs.clone(),
        coords: analysis.coords.clone(),
        variables: BTreeMap::new(),
    };

    for (name, an) in &analysis.variables {
        let Some(bg) = background.variable(name) else {
            debug!(variable = %name, "No background counterpart, skipping");
            continue;
        };
        if an.shape != bg.shape {
            warn!(
                variable = %name,
                analysis = ?an.shape,
                background = ?bg.shape,
                "Shape mismatch between analysis and background, skipping"
            );
            continue;
        }
        let data = an.data.iter().zip(&bg.data).map(|(a, b)| a - b).collect();
        out.variables.insert(
            name.clone(),
            Variable::new(an.dims.clone(), an.shape.clone(), data),
        );
    }

    out
}

/// Per-variable statistics of an increment dataset.
pub fn increment_stats(increment: &Dataset) -> BTreeMap<String, VariableStats> {
    increment
        .variables
        .par_iter()
        .map(|(name, variable)| (name.clone(), summarize(&variable.data)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;

    fn field(values: Vec<f32>) -> Variable {
        let n = values.len();
        Variable::new(vec!["x"], vec![n], values)
    }

    #[test]
    fn test_summarize() {
        let stats = summarize(&[1.0, -1.0, 3.0, -3.0]);
        assert_approx_eq!(stats.mean, 0.0, 1e-12);
        assert_approx_eq!(stats.rms, 5.0_f64.sqrt(), 1e-12);
        assert_eq!(stats.count, 4);
    }

    #[test]
    fn test_summarize_ignores_nan() {
        let stats = summarize(&[2.0, f32::NAN, 2.0]);
        assert_eq!(stats.count, 2);
        assert_approx_eq!(stats.mean, 2.0, 1e-12);
        assert_approx_eq!(stats.rms, 2.0, 1e-12);

        let empty = summarize(&[f32::NAN]);
        assert_eq!(empty.count, 0);
        assert!(empty.mean.is_nan());
    }

    #[test]
    fn test_increment_common_variables_only() {
        let analysis = Dataset::new()
            .with_coord("x", vec![0.0, 1.0, 2.0])
            .with_variable("t", field(vec![281.0, 282.0, 283.0]))
            .with_variable("q", field(vec![0.1, 0.1, 0.1]))
            .with_variable("sp", Variable::new(vec!["x"], vec![2], vec![1.0, 2.0]));
        let background = Dataset::new()
            .with_coord("x", vec![0.0, 1.0, 2.0])
            .with_variable("t", field(vec![280.0, 280.0, 280.0]))
            .with_variable("sp", field(vec![1.0, 2.0, 3.0]));

        let inc = increment(&analysis, &background);
        assert_eq!(inc.variable_names().collect::<Vec<_>>(), vec!["t"]);
        assert_eq!(inc.variable("t").unwrap().data, vec![1.0, 2.0, 3.0]);
        assert!(inc.has_coord("x"));

        let stats = increment_stats(&inc);
        assert_approx_eq!(stats["t"].mean, 2.0, 1e-9);
    }
}
