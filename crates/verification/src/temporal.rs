//! Cycle-to-cycle consistency: analysis at T against the forecast from T-6h.

use crate::increment::{increment, increment_stats, VariableStats};
use esda_common::Dataset;
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// RMS jump above which a variable is flagged (about 2 K for temperature).
pub const DEFAULT_JUMP_THRESHOLD: f64 = 2.0;

/// A variable whose RMS jump exceeded the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalAlert {
    pub variable: String,
    pub rms_jump: f64,
}

impl fmt::Display for TemporalAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WARNING: High temporal jump in {}: {:.4}",
            self.variable, self.rms_jump
        )
    }
}

/// Outcome of a temporal consistency check.
#[derive(Debug, Clone)]
pub struct TemporalCheck {
    /// analysis - previous forecast
    pub jump: Dataset,
    pub stats: BTreeMap<String, VariableStats>,
    pub alerts: Vec<TemporalAlert>,
}

impl TemporalCheck {
    pub fn is_consistent(&self) -> bool {
        self.alerts.is_empty()
    }
}

/// Compare an analysis with the previous cycle's forecast valid at the same time.
pub fn check_temporal_consistency(
    analysis: &Dataset,
    previous_forecast: &Dataset,
    threshold: f64,
) -> TemporalCheck {
    let jump = increment(analysis, previous_forecast);
    let stats = increment_stats(&jump);

    let alerts: Vec<TemporalAlert> = stats
        .iter()
        .filter(|(_, s)| s.rms > threshold)
        .map(|(name, s)| TemporalAlert {
            variable: name.clone(),
            rms_jump: s.rms,
        })
        .collect();

    for alert in &alerts {
        warn!(variable = %alert.variable, rms_jump = alert.rms_jump, threshold, "{}", alert);
    }

    TemporalCheck { jump, stats, alerts }
}
