//! External collaborators of a cycle: the DA system and the forecast runtime.

use crate::config::CommandConfig;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Files handed to the data assimilation system.
#[derive(Debug, Clone)]
pub struct AssimilationRequest {
    pub background: PathBuf,
    pub analysis: PathBuf,
    pub obs_dir: PathBuf,
}

/// Produces an analysis from a background and observations.
#[async_trait]
pub trait DaBridge: Send + Sync {
    async fn assimilate(&self, request: &AssimilationRequest) -> Result<()>;
}

/// Runs a forecast from an analysis.
#[async_trait]
pub trait ForecastRuntime: Send + Sync {
    async fn rollout(&self, analysis: &Path, output: &Path, lead_time_hours: u32) -> Result<()>;
}

/// An external program with placeholder arguments, run under a timeout.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    lead_time_hours: u32,
}

impl ExternalCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
            lead_time_hours: 6,
        }
    }

    pub fn from_config(config: &CommandConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            lead_time_hours: config.lead_time_hours,
        }
    }

    pub fn lead_time_hours(&self) -> u32 {
        self.lead_time_hours
    }

    /// Arguments with every `{name}` placeholder replaced.
    pub fn render_args(&self, placeholders: &[(&str, String)]) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                placeholders.iter().fold(arg.clone(), |acc, (name, value)| {
                    acc.replace(&format!("{{{}}}", name), value)
                })
            })
            .collect()
    }

    /// Run to completion, failing on a non-zero exit or when the timeout expires.
    #[instrument(skip(self, placeholders), fields(program = %self.program))]
    pub async fn run(&self, placeholders: &[(&str, String)]) -> Result<()> {
        let args = self.render_args(placeholders);
        debug!(args = ?args, timeout_secs = self.timeout.as_secs(), "Running external command");

        let mut command = Command::new(&self.program);
        command.args(&args).kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| anyhow!("{} timed out after {}s", self.program, self.timeout.as_secs()))?
            .with_context(|| format!("Failed to run {}", self.program))?;

        if !output.status.success() {
            return Err(anyhow!(
                "{} failed ({}): {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        info!(program = %self.program, "External command completed");
        Ok(())
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

#[async_trait]
impl DaBridge for ExternalCommand {
    async fn assimilate(&self, request: &AssimilationRequest) -> Result<()> {
        self.run(&[
            ("background", display(&request.background)),
            ("analysis", display(&request.analysis)),
            ("obs", display(&request.obs_dir)),
        ])
        .await
    }
}

#[async_trait]
impl ForecastRuntime for ExternalCommand {
    async fn rollout(&self, analysis: &Path, output: &Path, lead_time_hours: u32) -> Result<()> {
        self.run(&[
            ("analysis", display(analysis)),
            ("forecast", display(output)),
            ("lead_time", lead_time_hours.to_string()),
        ])
        .await
    }
}
