//! One assimilation cycle: prepare, assimilate, verify, forecast, and an
//! optional sensitivity test.

use crate::collaborators::{AssimilationRequest, DaBridge, ExternalCommand, ForecastRuntime};
use crate::config::CycleConfig;
use crate::paths::CyclePaths;
use anyhow::{Context, Result};
use esda_common::Dataset;
use model_ident::{Identifier, IdentifyOptions, ResolutionMethod, CRTM_GRID};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use verification::{
    check_temporal_consistency, increment, increment_stats, perturb, sensitivity, summarize,
    ReportCard, VariableStats, VerificationError, VerticalInterpolator,
};

/// Result of the prepare stage.
#[derive(Debug, Clone)]
pub struct PrepareOutcome {
    pub model: String,
    pub method: ResolutionMethod,
    pub background: PathBuf,
    pub geovals: Option<PathBuf>,
}

/// Result of the verify stage.
#[derive(Debug, Clone)]
pub struct VerifyOutcome {
    pub stats: BTreeMap<String, VariableStats>,
    /// Temporal consistency alerts against the previous cycle's forecast
    pub alerts: Vec<String>,
    pub report: PathBuf,
}

/// Result of the sensitivity stage.
#[derive(Debug, Clone)]
pub struct SensitivityOutcome {
    pub variable: String,
    pub epsilon: f64,
    /// Sensitivity map written to the diagnostics directory
    pub map: PathBuf,
    pub stats: VariableStats,
}

#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub prepared: PrepareOutcome,
    pub assimilated: bool,
    pub verification: Option<VerifyOutcome>,
    pub forecast: Option<PathBuf>,
    pub sensitivity: Option<SensitivityOutcome>,
}

pub struct CycleRunner {
    identifier: Identifier,
    config: CycleConfig,
    paths: CyclePaths,
    da: Option<Arc<dyn DaBridge>>,
    runtime: Option<Arc<dyn ForecastRuntime>>,
}

impl CycleRunner {
    /// Runner whose collaborators are the external commands named in the config.
    pub fn new(identifier: Identifier, config: CycleConfig, paths: CyclePaths) -> Self {
        let da = config
            .assimilation
            .as_ref()
            .map(|c| Arc::new(ExternalCommand::from_config(c)) as Arc<dyn DaBridge>);
        let runtime = config
            .forecast
            .as_ref()
            .map(|c| Arc::new(ExternalCommand::from_config(c)) as Arc<dyn ForecastRuntime>);
        Self {
            identifier,
            config,
            paths,
            da,
            runtime,
        }
    }

    pub fn with_da_bridge(mut self, da: Arc<dyn DaBridge>) -> Self {
        self.da = Some(da);
        self
    }

    pub fn with_forecast_runtime(mut self, runtime: Arc<dyn ForecastRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn paths(&self) -> &CyclePaths {
        &self.paths
    }

    fn identify_options(&self) -> IdentifyOptions {
        IdentifyOptions {
            model: self.config.input.model.clone(),
            interface: self.config.interface.clone(),
        }
    }

    fn lead_time_hours(&self) -> u32 {
        self.config
            .forecast
            .as_ref()
            .map(|c| c.lead_time_hours)
            .unwrap_or(6)
    }

    /// Identify, validate and standardize the incoming forecast into the background file.
    pub fn prepare(&self, input: &Path) -> Result<PrepareOutcome> {
        self.paths.create_dirs()?;

        let raw = Dataset::from_json_file(input)
            .with_context(|| format!("Failed to read forecast dataset {:?}", input))?;
        let prepared = self
            .identifier
            .prepare(&raw, &self.identify_options())
            .with_context(|| format!("Dataset {:?} cannot be used as background", input))?;

        let background = self.paths.background_file();
        prepared
            .state
            .to_json_file(&background)
            .with_context(|| format!("Failed to write background {:?}", background))?;

        info!(
            model = %prepared.identity.key(),
            method = %prepared.identity.method,
            background = %background.display(),
            "Background ready"
        );

        let geovals = if self.config.verification.geovals {
            self.write_geovals(&prepared.state)?
        } else {
            None
        };

        Ok(PrepareOutcome {
            model: prepared.identity.key().to_string(),
            method: prepared.identity.method,
            background,
            geovals,
        })
    }

    fn write_geovals(&self, state: &Dataset) -> Result<Option<PathBuf>> {
        let grid = self
            .identifier
            .registry()
            .reference_grid(CRTM_GRID)
            .with_context(|| format!("Registry has no '{}' reference grid", CRTM_GRID))?;
        let interpolator = VerticalInterpolator::new(grid.values.clone())?;

        match interpolator.generate_geovals(state) {
            Ok(geovals) => {
                let path = self.paths.geovals_file();
                geovals
                    .to_json_file(&path)
                    .with_context(|| format!("Failed to write GeoVaLs {:?}", path))?;
                info!(path = %path.display(), levels = grid.len(), "GeoVaLs written");
                Ok(Some(path))
            }
            Err(VerificationError::MissingVerticalAxis(axis)) => {
                warn!(axis = %axis, "State has no vertical profiles, skipping GeoVaLs");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Hand the background to the DA system. Returns false when none is configured.
    pub async fn assimilate(&self) -> Result<bool> {
        let Some(da) = &self.da else {
            info!("No data assimilation configured, skipping");
            return Ok(false);
        };

        let request = AssimilationRequest {
            background: self.paths.background_file(),
            analysis: self.paths.analysis_file(),
            obs_dir: self.paths.obs_dir.clone(),
        };
        anyhow::ensure!(
            request.background.is_file(),
            "Background {:?} missing, run prepare first",
            request.background
        );

        da.assimilate(&request)
            .await
            .with_context(|| format!("Data assimilation failed for cycle {}", self.paths.time))?;

        if !request.analysis.is_file() {
            warn!(analysis = %request.analysis.display(), "DA finished without writing an analysis");
        }
        Ok(true)
    }

    /// Increment statistics into the report card, plus the temporal check.
    ///
    /// Skipped (`None`) when the cycle has no analysis.
    pub fn verify(&self) -> Result<Option<VerifyOutcome>> {
        let analysis_path = self.paths.analysis_file();
        if !analysis_path.is_file() {
            info!(analysis = %analysis_path.display(), "No analysis, skipping verification");
            return Ok(None);
        }

        let analysis = Dataset::from_json_file(&analysis_path)
            .with_context(|| format!("Failed to read analysis {:?}", analysis_path))?;
        let background_path = self.paths.background_file();
        let background = Dataset::from_json_file(&background_path)
            .with_context(|| format!("Failed to read background {:?}", background_path))?;

        let inc = increment(&analysis, &background);
        let stats = increment_stats(&inc);
        for (variable, s) in &stats {
            info!(variable = %variable, mean = s.mean, rms = s.rms, "Analysis increment");
        }

        let report = self.update_report_card(&stats)?;

        let previous_forecast = self.paths.previous().forecast_file();
        let alerts = if previous_forecast.is_file() {
            let forecast = Dataset::from_json_file(&previous_forecast)
                .with_context(|| format!("Failed to read previous forecast {:?}", previous_forecast))?;
            check_temporal_consistency(&analysis, &forecast, self.config.verification.jump_threshold)
                .alerts
                .iter()
                .map(ToString::to_string)
                .collect()
        } else {
            info!(forecast = %previous_forecast.display(), "No previous forecast, skipping temporal check");
            Vec::new()
        };

        Ok(Some(VerifyOutcome {
            stats,
            alerts,
            report,
        }))
    }

    fn update_report_card(&self, stats: &BTreeMap<String, VariableStats>) -> Result<PathBuf> {
        let dir = self
            .config
            .verification
            .report_dir
            .clone()
            .unwrap_or_else(|| self.paths.report_dir());

        let mut card = ReportCard::new(self.config.expid.clone());
        let existing = dir.join(card.file_name());
        if existing.is_file() {
            card = ReportCard::load_csv(self.config.expid.clone(), &existing)
                .with_context(|| format!("Failed to load report card {:?}", existing))?;
        }

        let (date, cycle) = (self.paths.time.date_str(), self.paths.time.cycle_str());
        card.remove_cycle(&date, &cycle);
        card.collect_cycle_metrics(&date, &cycle, stats)?;
        Ok(card.write_csv(&dir)?)
    }

    /// Start the forecast from this cycle's analysis.
    pub async fn forecast(&self) -> Result<Option<PathBuf>> {
        let Some(runtime) = &self.runtime else {
            info!("No forecast runtime configured, skipping");
            return Ok(None);
        };

        let analysis = self.paths.analysis_file();
        if !analysis.is_file() {
            warn!(analysis = %analysis.display(), "No analysis to start the forecast from");
            return Ok(None);
        }

        let output = self.paths.forecast_file();
        runtime
            .rollout(&analysis, &output, self.lead_time_hours())
            .await
            .with_context(|| format!("Forecast failed for cycle {}", self.paths.time))?;

        info!(forecast = %output.display(), "Forecast complete");
        Ok(Some(output))
    }

    /// Sensitivity of the forecast to a perturbation of one analysis variable.
    ///
    /// Skipped (`None`) unless configured, and when there is no forecast
    /// runtime or no analysis.
    pub async fn sensitivity(&self) -> Result<Option<SensitivityOutcome>> {
        let Some(settings) = &self.config.verification.sensitivity else {
            return Ok(None);
        };
        let Some(runtime) = &self.runtime else {
            info!("No forecast runtime configured, skipping sensitivity test");
            return Ok(None);
        };
        let analysis_path = self.paths.analysis_file();
        if !analysis_path.is_file() {
            warn!(analysis = %analysis_path.display(), "No analysis to perturb");
            return Ok(None);
        }

        let analysis = Dataset::from_json_file(&analysis_path)
            .with_context(|| format!("Failed to read analysis {:?}", analysis_path))?;
        let perturbed = perturb(&analysis, &settings.variable, settings.epsilon)?;
        let perturbed_path = self.paths.perturbed_state_file();
        perturbed
            .to_json_file(&perturbed_path)
            .with_context(|| format!("Failed to write perturbed state {:?}", perturbed_path))?;

        let output_path = self.paths.perturbed_forecast_file();
        runtime
            .rollout(&perturbed_path, &output_path, self.lead_time_hours())
            .await
            .with_context(|| format!("Perturbed forecast failed for cycle {}", self.paths.time))?;
        let output = Dataset::from_json_file(&output_path)
            .with_context(|| format!("Failed to read perturbed forecast {:?}", output_path))?;

        let map = sensitivity(&analysis, &output, &settings.variable, settings.epsilon)?;
        let stats = map
            .variable(&settings.variable)
            .map(|v| summarize(&v.data))
            .with_context(|| format!("Sensitivity map lacks '{}'", settings.variable))?;
        let map_path = self.paths.sensitivity_file(&settings.variable);
        map.to_json_file(&map_path)
            .with_context(|| format!("Failed to write sensitivity map {:?}", map_path))?;

        info!(
            variable = %settings.variable,
            epsilon = settings.epsilon,
            mean = stats.mean,
            rms = stats.rms,
            map = %map_path.display(),
            "Sensitivity test complete"
        );
        Ok(Some(SensitivityOutcome {
            variable: settings.variable.clone(),
            epsilon: settings.epsilon,
            map: map_path,
            stats,
        }))
    }

    /// Every stage in order; the sensitivity test runs last, when configured.
    pub async fn run(&self, input: &Path) -> Result<CycleOutcome> {
        info!(cycle = %self.paths.time, expid = %self.config.expid, "Starting cycle");

        let prepared = self.prepare(input)?;
        let assimilated = self.assimilate().await?;
        let verification = self.verify()?;
        let forecast = self.forecast().await?;
        let sensitivity = self.sensitivity().await?;

        info!(cycle = %self.paths.time, "Cycle complete");
        Ok(CycleOutcome {
            prepared,
            assimilated,
            verification,
            forecast,
            sensitivity,
        })
    }
}
