//! Cycle configuration (`cycle.yaml`).
//!
//! Supports environment variable substitution using `${VAR}` and
//! `${VAR:-default}` syntax before the YAML is parsed.

use anyhow::{Context, Result};
use model_ident::InterfaceConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use verification::{DEFAULT_EPSILON, DEFAULT_JUMP_THRESHOLD};

// ============================================================================
// Cycle Configuration (cycle.yaml)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleConfig {
    #[serde(default = "default_expid")]
    pub expid: String,
    /// Experiment root; falls back to `AIESDA_HOME`
    #[serde(default)]
    pub home: Option<PathBuf>,
    #[serde(default)]
    pub input: InputConfig,
    /// External data assimilation command
    #[serde(default)]
    pub assimilation: Option<CommandConfig>,
    /// External forecast runtime command
    #[serde(default)]
    pub forecast: Option<CommandConfig>,
    #[serde(default)]
    pub verification: VerificationConfig,
    /// Adapter settings passed to the model interface
    #[serde(default)]
    pub interface: Option<InterfaceConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    /// Forecast dataset path; `{date}` and `{cycle}` are filled in per cycle
    #[serde(default)]
    pub forecast: Option<String>,
    /// Registry key to use instead of identifying the dataset
    #[serde(default)]
    pub model: Option<String>,
}

/// An external program invoked by the cycle.
///
/// Arguments may carry placeholders (`{background}`, `{analysis}`,
/// `{obs}`, `{forecast}`, `{lead_time}`) that are filled in per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_lead_time_hours")]
    pub lead_time_hours: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// RMS jump against the previous forecast that raises an alert
    #[serde(default = "default_jump_threshold")]
    pub jump_threshold: f64,
    /// Where `<expid>_metrics.csv` lives; defaults to `<home>/<expid>/reports`
    #[serde(default)]
    pub report_dir: Option<PathBuf>,
    /// Also write GeoVaLs on the radiative-transfer reference grid
    #[serde(default)]
    pub geovals: bool,
    /// Run the forecast model again from a perturbed analysis
    #[serde(default)]
    pub sensitivity: Option<SensitivityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityConfig {
    /// Variable of the analysis to perturb
    pub variable: String,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            jump_threshold: default_jump_threshold(),
            report_dir: None,
            geovals: false,
            sensitivity: None,
        }
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            expid: default_expid(),
            home: None,
            input: InputConfig::default(),
            assimilation: None,
            forecast: None,
            verification: VerificationConfig::default(),
            interface: None,
        }
    }
}

fn default_expid() -> String {
    "test_run".to_string()
}

fn default_timeout_secs() -> u64 {
    3600
}

fn default_lead_time_hours() -> u32 {
    6
}

fn default_jump_threshold() -> f64 {
    DEFAULT_JUMP_THRESHOLD
}

fn default_epsilon() -> f64 {
    DEFAULT_EPSILON
}

impl InputConfig {
    /// Forecast path for one cycle, with `{date}` and `{cycle}` substituted.
    pub fn forecast_path(&self, date: &str, cycle: &str) -> Option<PathBuf> {
        self.forecast
            .as_ref()
            .map(|template| PathBuf::from(template.replace("{date}", date).replace("{cycle}", cycle)))
    }
}

// ============================================================================
// Loading Functions
// ============================================================================

/// Load and parse cycle.yaml with environment variable substitution
pub fn load_cycle_config<P: AsRef<Path>>(path: P) -> Result<CycleConfig> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read cycle config from {:?}", path.as_ref()))?;

    parse_cycle_config(&content)
        .with_context(|| format!("Invalid cycle config {:?}", path.as_ref()))
}

/// Parse cycle configuration YAML after environment substitution.
pub fn parse_cycle_config(content: &str) -> Result<CycleConfig> {
    let expanded = expand_env_vars(content)?;

    let config: CycleConfig =
        serde_yaml::from_str(&expanded).with_context(|| "Failed to parse cycle config YAML")?;

    validate_cycle_config(&config)?;

    Ok(config)
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in YAML content
/// Supports ${VAR} and ${VAR:-default} syntax
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::new();
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            let mut brace_count = 1;

            while brace_count > 0 {
                match chars.next() {
                    Some('{') => {
                        brace_count += 1;
                        var_expr.push('{');
                    }
                    Some('}') => {
                        brace_count -= 1;
                        if brace_count > 0 {
                            var_expr.push('}');
                        }
                    }
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Resolve variable expression (supports VAR and VAR:-default syntax)
fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

// ============================================================================
// Validation
// ============================================================================

fn validate_cycle_config(config: &CycleConfig) -> Result<()> {
    anyhow::ensure!(!config.expid.trim().is_empty(), "Experiment ID cannot be empty");
    anyhow::ensure!(
        !config.expid.contains(std::path::MAIN_SEPARATOR),
        "Experiment ID cannot contain a path separator: {}",
        config.expid
    );

    for (stage, command) in [
        ("assimilation", &config.assimilation),
        ("forecast", &config.forecast),
    ] {
        if let Some(command) = command {
            anyhow::ensure!(
                !command.program.trim().is_empty(),
                "{} program cannot be empty",
                stage
            );
            anyhow::ensure!(
                command.timeout_secs > 0,
                "{} timeout must be greater than 0",
                stage
            );
        }
    }

    anyhow::ensure!(
        config.verification.jump_threshold.is_finite() && config.verification.jump_threshold > 0.0,
        "Jump threshold must be a positive number, got {}",
        config.verification.jump_threshold
    );

    if let Some(sensitivity) = &config.verification.sensitivity {
        anyhow::ensure!(
            !sensitivity.variable.trim().is_empty(),
            "Sensitivity variable cannot be empty"
        );
        anyhow::ensure!(
            sensitivity.epsilon.is_finite() && sensitivity.epsilon != 0.0,
            "Sensitivity epsilon must be finite and non-zero, got {}",
            sensitivity.epsilon
        );
    }

    if let Some(interface) = &config.interface {
        if let Some(resolution) = interface.resolution {
            anyhow::ensure!(resolution > 0.0, "Interface resolution must be positive");
        }
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
