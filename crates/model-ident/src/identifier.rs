//! End-to-end identification: resolve, validate, standardize.
//!
//! Each call is independent; the only shared state is the immutable
//! registry, so one [`Identifier`] can serve any number of threads.

use crate::error::Result;
use crate::interfaces::{ForecastInterface, InterfaceConfig, InterfaceFactory, ModelInterface};
use crate::registry::Registry;
use crate::resolver::{IdentityResolver, ResolutionMethod, ResolveOptions};
use crate::validator::ContractValidator;
use esda_common::{Dataset, StandardizedDataset};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::info;

/// Caller options for one identification.
#[derive(Debug, Clone, Default)]
pub struct IdentifyOptions {
    /// Registry key to use instead of resolving
    pub model: Option<String>,
    /// Adapter settings
    pub interface: Option<InterfaceConfig>,
}

/// A resolved identity: the registry key and its adapter.
#[derive(Debug, Clone)]
pub struct Identity {
    pub method: ResolutionMethod,
    pub interface: ModelInterface,
}

impl Identity {
    pub fn key(&self) -> &str {
        self.interface.model_key()
    }
}

/// A validated, standardized dataset and the identity it was prepared for.
#[derive(Debug, Clone)]
pub struct PreparedState {
    pub identity: Identity,
    pub state: StandardizedDataset,
}

/// Entry point tying registry, resolver, validator and adapters together.
#[derive(Debug, Clone)]
pub struct Identifier {
    registry: Arc<Registry>,
    factory: InterfaceFactory,
}

impl Identifier {
    /// Fails if the registry names an adapter with no implementation.
    pub fn new(registry: Arc<Registry>) -> Result<Self> {
        let factory = InterfaceFactory::new(Arc::clone(&registry))?;
        Ok(Self { registry, factory })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn factory(&self) -> &InterfaceFactory {
        &self.factory
    }

    /// Resolve the dataset's identity and build its adapter.
    pub fn identify(&self, dataset: &Dataset, options: &IdentifyOptions) -> Result<Identity> {
        let resolve = ResolveOptions {
            model: options.model.clone(),
        };
        let resolved = IdentityResolver::new(&self.registry).resolve(dataset, &resolve)?;
        let interface = self
            .factory
            .create(resolved.key(), options.interface.as_ref())?;
        Ok(Identity {
            method: resolved.method,
            interface,
        })
    }

    /// Identify, validate and standardize one dataset.
    ///
    /// A dataset that fails validation is never standardized.
    pub fn prepare(&self, dataset: &Dataset, options: &IdentifyOptions) -> Result<PreparedState> {
        let identity = self.identify(dataset, options)?;
        ContractValidator::new(&self.registry).validate_spec(dataset, identity.interface.spec())?;
        let state = identity.interface.prepare_state(dataset);

        info!(
            model = %identity.key(),
            method = %identity.method,
            variables = state.variables.len(),
            "Prepared standardized state"
        );
        Ok(PreparedState { identity, state })
    }

    /// Prepare several datasets in parallel; results keep input order.
    pub fn prepare_batch(
        &self,
        datasets: &[Dataset],
        options: &IdentifyOptions,
    ) -> Vec<Result<PreparedState>> {
        datasets
            .par_iter()
            .map(|dataset| self.prepare(dataset, options))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{IdentError, Violation};
    use esda_common::Variable;

    fn identifier() -> Identifier {
        Identifier::new(Arc::new(Registry::builtin())).unwrap()
    }

    fn station_obs(nan: bool) -> Dataset {
        let t = if nan { f32::NAN } else { 290.0 };
        Dataset::new()
            .with_attr("source", "MONITOBS synop feed")
            .with_variable("tair", Variable::new(vec!["station"], vec![2], vec![t, 291.0]))
            .with_variable("pres", Variable::new(vec!["station"], vec![2], vec![1.0e5; 2]))
    }

    #[test]
    fn test_prepare_station_data() {
        let prepared = identifier().prepare(&station_obs(true), &IdentifyOptions::default()).unwrap();
        assert_eq!(prepared.identity.key(), "monitobs");
        assert_eq!(prepared.identity.method, ResolutionMethod::Metadata);
        assert!(prepared.state.has_variable("air_temperature"));
    }

    #[test]
    fn test_invalid_dataset_not_standardized() {
        let mut ds = station_obs(false);
        ds.remove_variable("pres");
        let err = identifier().prepare(&ds, &IdentifyOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            IdentError::ContractViolation { violation: Violation::MissingVariables(ref v), .. }
                if v == &vec!["pres".to_string()]
        ));
    }

    #[test]
    fn test_prepare_batch_keeps_order() {
        let datasets = vec![station_obs(false), Dataset::new(), station_obs(true)];
        let results = identifier().prepare_batch(&datasets, &IdentifyOptions::default());
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(IdentError::NotIdentifiable { levels: None })));
        assert!(results[2].is_ok());
    }
}
