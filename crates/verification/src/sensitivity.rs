//! Sensitivity of the model output to a perturbed initial state.
//!
//! One variable of the analysis is shifted by `epsilon`, the shifted state
//! is run through the forecast model, and the sensitivity at every point is
//! `(A(x + epsilon) - A(x)) / epsilon`.

use crate::error::{Result, VerificationError};
use esda_common::{Dataset, Variable};
use std::collections::BTreeMap;
use tracing::debug;

/// Perturbation added when none is configured.
pub const DEFAULT_EPSILON: f64 = 0.1;

/// Attribute recording the perturbation on a sensitivity map.
pub const EPSILON_ATTR: &str = "perturbation_epsilon";

fn check_epsilon(epsilon: f64) -> Result<()> {
    if epsilon.is_finite() && epsilon != 0.0 {
        Ok(())
    } else {
        Err(VerificationError::InvalidEpsilon(epsilon))
    }
}

/// Copy of `state` with `epsilon` added to every value of `variable`.
///
/// NaN values stay NaN. Every other variable is left untouched.
pub fn perturb(state: &Dataset, variable: &str, epsilon: f64) -> Result<Dataset> {
    check_epsilon(epsilon)?;
    let source = state
        .variable(variable)
        .ok_or_else(|| VerificationError::MissingVariable(variable.to_string()))?;

    let shift = epsilon as f32;
    let mut perturbed = state.clone();
    perturbed
        .variables
        .insert(variable.to_string(), source.map_values(|v| v + shift));
    debug!(variable = %variable, epsilon, "Perturbed initial state");
    Ok(perturbed)
}

/// Sensitivity map of `variable` between the base state and the model
/// output started from the perturbed state.
///
/// The map keeps the base coordinates and carries the single variable
/// under its own name.
pub fn sensitivity(
    base: &Dataset,
    perturbed_output: &Dataset,
    variable: &str,
    epsilon: f64,
) -> Result<Dataset> {
    check_epsilon(epsilon)?;
    let missing = || VerificationError::MissingVariable(variable.to_string());
    let b = base.variable(variable).ok_or_else(missing)?;
    let p = perturbed_output.variable(variable).ok_or_else(missing)?;
    b.check(variable)?;
    p.check(variable)?;
    if b.shape != p.shape {
        return Err(VerificationError::ShapeMismatch {
            variable: variable.to_string(),
            expected: b.shape.clone(),
            actual: p.shape.clone(),
        });
    }

    let data = p
        .data
        .iter()
        .zip(&b.data)
        .map(|(&a, &x)| ((a as f64 - x as f64) / epsilon) as f32)
        .collect();
    let map = Variable::new(b.dims.clone(), b.shape.clone(), data)
        .with_attr(EPSILON_ATTR, epsilon.to_string());

    let mut out = Dataset {
        attrs: base.attrs.clone(),
        coords: base.coords.clone(),
        variables: BTreeMap::new(),
    };
    out.attrs.insert(EPSILON_ATTR, epsilon.to_string());
    out.variables.insert(variable.to_string(), map);
    Ok(out)
}
