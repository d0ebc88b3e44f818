//! Registry configuration loading from YAML.
//!
//! Two layouts are supported:
//! - a single file with `models:` and `reference_grids:` sections
//!   ([`Registry::from_yaml_file`]);
//! - a configuration directory holding an optional `registry.yaml` plus one
//!   file per model under `models/` ([`Registry::from_config_dir`]).
//!
//! Load failures are startup errors: they are logged as CRITICAL and
//! returned to the caller, never papered over with the builtin tables.

use super::{builtin, Registry};
use crate::error::{IdentError, Result};
use crate::spec::{LevelFingerprint, ModelSpec};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use walkdir::WalkDir;

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "AIESDA_CONFIG_DIR";

/// Configuration directory used when the environment does not name one.
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// On-disk shape of a registry file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub models: Vec<ModelSpec>,
    #[serde(default)]
    pub reference_grids: Vec<LevelFingerprint>,
}

impl RegistryConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| IdentError::InvalidConfig(format!("Invalid registry YAML: {}", e)))
    }

    pub fn into_registry(self) -> Result<Registry> {
        Registry::new(self.models, self.reference_grids)
    }
}

/// The configuration directory: `$AIESDA_CONFIG_DIR`, else `config`.
pub fn config_dir() -> PathBuf {
    match env::var(CONFIG_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(DEFAULT_CONFIG_DIR),
    }
}

fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| IdentError::InvalidConfig(format!("Cannot read {:?}: {}", path, e)))
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

impl Registry {
    /// Parse and validate a registry from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        RegistryConfig::from_yaml_str(yaml)?.into_registry()
    }

    /// Load a single registry file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let registry = read_config(path)
            .and_then(|contents| Self::from_yaml_str(&contents))
            .map_err(|e| {
                error!(
                    path = ?path,
                    error = %e,
                    "CRITICAL: Failed to load model registry. Identification cannot proceed."
                );
                e
            })?;

        info!(path = ?path, models = registry.len(), "Loaded model registry");
        Ok(registry)
    }

    /// Load a registry from a configuration directory.
    ///
    /// `registry.yaml` (optional) contributes models and reference grids;
    /// every YAML file below `models/` contributes one model, in file-name
    /// order. Without any reference grid in the directory the builtin
    /// grids are used.
    pub fn from_config_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let result = Self::collect_config_dir(dir).and_then(RegistryConfig::into_registry);

        match result {
            Ok(registry) if registry.is_empty() => {
                error!(
                    path = ?dir,
                    "CRITICAL: Configuration directory defines no models. \
                     Add model files under 'models/' or a 'registry.yaml'."
                );
                Err(IdentError::InvalidConfig(format!(
                    "No models defined in {:?}",
                    dir
                )))
            }
            Ok(registry) => {
                info!(path = ?dir, models = registry.len(), "Loaded model registry");
                Ok(registry)
            }
            Err(e) => {
                error!(
                    path = ?dir,
                    error = %e,
                    "CRITICAL: Failed to load model registry. Identification cannot proceed."
                );
                Err(e)
            }
        }
    }

    fn collect_config_dir(dir: &Path) -> Result<RegistryConfig> {
        let mut config = RegistryConfig::default();

        let registry_file = dir.join("registry.yaml");
        if registry_file.exists() {
            config = RegistryConfig::from_yaml_str(&read_config(&registry_file)?)?;
            debug!(path = ?registry_file, models = config.models.len(), "Read registry file");
        }

        let models_dir = dir.join("models");
        if models_dir.is_dir() {
            let mut files = Vec::new();
            for entry in WalkDir::new(&models_dir).min_depth(1).sort_by_file_name() {
                let entry = entry.map_err(|e| {
                    IdentError::InvalidConfig(format!("Cannot walk {:?}: {}", models_dir, e))
                })?;
                if entry.file_type().is_file() && is_yaml(entry.path()) {
                    files.push(entry.into_path());
                }
            }

            for path in files {
                let spec: ModelSpec = serde_yaml::from_str(&read_config(&path)?).map_err(|e| {
                    IdentError::InvalidConfig(format!("Invalid YAML in {:?}: {}", path, e))
                })?;
                debug!(model = %spec.key, path = ?path, "Read model file");
                config.models.push(spec);
            }
        }

        if config.reference_grids.is_empty() {
            config.reference_grids = builtin::reference_grids();
        }
        Ok(config)
    }

    /// Registry from the configuration directory if it defines one,
    /// otherwise the builtin tables.
    pub fn load_default() -> Result<Self> {
        let dir = config_dir();
        if dir.join("registry.yaml").exists() || dir.join("models").is_dir() {
            Self::from_config_dir(&dir)
        } else {
            info!(path = ?dir, "No registry configuration found, using builtin registry");
            Ok(Self::builtin())
        }
    }
}
