//! Identity resolution: which registry entry produced a dataset.
//!
//! Resolution order, first hit wins:
//! 1. caller override (`ResolveOptions::model`)
//! 2. metadata: a registry key found as a substring of the lower-cased
//!    attribute values
//! 3. vertical fingerprint: the dataset's level values match an entry's
//!    reference level set within [`LEVEL_TOLERANCE`]
//!
//! Anything else is [`IdentError::NotIdentifiable`]; the resolver never
//! falls back to a default model.

use crate::error::{IdentError, Result};
use crate::fingerprint::{vertical_axis, FingerprintMatcher, LEVEL_TOLERANCE};
use crate::registry::Registry;
use crate::spec::ModelSpec;
use esda_common::Dataset;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How an identity was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    Override,
    Metadata,
    Fingerprint,
}

impl std::fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResolutionMethod::Override => "override",
            ResolutionMethod::Metadata => "metadata",
            ResolutionMethod::Fingerprint => "fingerprint",
        };
        f.write_str(name)
    }
}

/// Caller-supplied resolution hints.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Registry key to use instead of resolving
    pub model: Option<String>,
}

impl ResolveOptions {
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
        }
    }
}

/// A resolved registry entry.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub spec: Arc<ModelSpec>,
    pub method: ResolutionMethod,
}

impl Resolved {
    pub fn key(&self) -> &str {
        &self.spec.key
    }
}

/// Resolves datasets against a registry.
pub struct IdentityResolver<'a> {
    registry: &'a Registry,
    tolerance: f64,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            tolerance: LEVEL_TOLERANCE,
        }
    }

    pub fn resolve(&self, dataset: &Dataset, options: &ResolveOptions) -> Result<Resolved> {
        if let Some(key) = options.model.as_deref() {
            let spec = self
                .registry
                .get_shared(key)
                .ok_or_else(|| IdentError::UnknownModel(key.to_string()))?;
            debug!(model = %key, "Using caller-supplied model");
            return Ok(Resolved {
                spec,
                method: ResolutionMethod::Override,
            });
        }

        if let Some(key) = self.match_metadata(dataset) {
            info!(model = %key, "Identified dataset from metadata");
            return self.resolved(key, ResolutionMethod::Metadata);
        }

        let key = self.match_fingerprint(dataset)?;
        info!(model = %key, "Identified dataset from vertical levels");
        self.resolved(key, ResolutionMethod::Fingerprint)
    }

    fn resolved(&self, key: &str, method: ResolutionMethod) -> Result<Resolved> {
        let spec = self
            .registry
            .get_shared(key)
            .ok_or_else(|| IdentError::UnknownModel(key.to_string()))?;
        Ok(Resolved { spec, method })
    }

    /// First registry key (enumeration order) contained in the attribute text.
    pub fn match_metadata(&self, dataset: &Dataset) -> Option<&'a str> {
        if dataset.attrs.is_empty() {
            return None;
        }
        let text = dataset.attrs.search_text();
        self.registry
            .iter()
            .map(|spec| spec.key.as_str())
            .filter(|key| !key.is_empty())
            .find(|key| text.contains(&key.to_lowercase()))
    }

    /// Registry key whose level fingerprint matches the dataset's vertical axis.
    ///
    /// With several matching entries, the one with the most of its required
    /// variables present in the dataset wins; a remaining tie goes to the
    /// first in enumeration order.
    pub fn match_fingerprint(&self, dataset: &Dataset) -> Result<&'a str> {
        let Some((axis, levels)) = vertical_axis(dataset) else {
            debug!("Dataset has no vertical axis to fingerprint");
            return Err(IdentError::NotIdentifiable { levels: None });
        };

        let candidates = FingerprintMatcher::new(self.registry)
            .with_tolerance(self.tolerance)
            .candidates(levels);

        match candidates.as_slice() {
            [] => {
                debug!(axis = %axis, levels = levels.len(), "No level fingerprint matched");
                Err(IdentError::NotIdentifiable {
                    levels: Some(levels.len()),
                })
            }
            [only] => Ok(only.key.as_str()),
            _ => {
                let (chosen, rejected) = choose_candidate(&candidates, dataset);
                warn!(
                    chosen = %chosen,
                    rejected = ?rejected,
                    levels = levels.len(),
                    "Several registry entries share this vertical fingerprint"
                );
                Ok(chosen)
            }
        }
    }
}

/// Pick among several fingerprint matches, returning the winner and the rest.
///
/// The candidate with the most of its required variables present in the
/// dataset wins; a remaining tie goes to the first in enumeration order.
fn choose_candidate<'s>(candidates: &[&'s ModelSpec], dataset: &Dataset) -> (&'s str, Vec<&'s str>) {
    let mut best: Option<(usize, usize)> = None;
    for (i, spec) in candidates.iter().enumerate() {
        let score = spec.required_present(|name| dataset.has_variable(name));
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((i, score));
        }
    }
    let winner = best.map_or(0, |(i, _)| i);
    let rejected = candidates
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != winner)
        .map(|(_, spec)| spec.key.as_str())
        .collect();
    (candidates[winner].key.as_str(), rejected)
}
