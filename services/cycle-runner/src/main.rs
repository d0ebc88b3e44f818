//! `aiesda`: run an AIESDA data assimilation cycle or identify forecast datasets.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cycle_runner::{
    home_from_env, load_cycle_config, CycleConfig, CyclePaths, CycleRunner, CycleTime,
};
use esda_common::Dataset;
use model_ident::{Identifier, IdentifyOptions, Registry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "aiesda")]
#[command(about = "AI-enabled Earth System Data Assimilation cycle runner")]
struct Args {
    /// Model registry YAML (default: $AIESDA_CONFIG_DIR or built-in tables)
    #[arg(long, env = "AIESDA_REGISTRY", global = true)]
    registry: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Log format: text or json
    #[arg(long, default_value = "text", global = true)]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Clone)]
struct CycleArgs {
    /// Cycle date YYYYMMDD
    #[arg(long)]
    date: String,

    /// Cycle hour (00, 06, 12, 18)
    #[arg(long)]
    cycle: String,

    /// Experiment ID (overrides the config file)
    #[arg(long)]
    expid: Option<String>,

    /// Cycle configuration file
    #[arg(short, long, env = "AIESDA_CYCLE_CONFIG")]
    config: Option<PathBuf>,

    /// Forecast dataset to use as background (overrides the config file)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Registry key to use instead of identifying the dataset
    #[arg(short, long)]
    model: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a full cycle: prepare, assimilate, verify, forecast
    Run(CycleArgs),

    /// Only prepare the background for a cycle
    Prepare(CycleArgs),

    /// Identify one dataset and print the resolved model
    Identify {
        /// Dataset JSON file
        input: PathBuf,

        #[arg(short, long)]
        model: Option<String>,
    },

    /// Identify and validate several datasets concurrently
    Batch {
        /// Dataset JSON files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[arg(short, long)]
        model: Option<String>,
    },

    /// Background error standard deviation from forecast and truth histories
    ErrorStats {
        /// Forecast history (dataset JSON with a time dimension)
        #[arg(long)]
        forecast: PathBuf,

        /// Verifying truth on the same grid and times
        #[arg(long)]
        truth: PathBuf,

        /// Output dataset JSON
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, &args.log_format)?;

    let registry = Arc::new(load_registry(args.registry.as_deref())?);
    info!(models = ?registry.keys().collect::<Vec<_>>(), "Loaded model registry");
    let identifier = Identifier::new(registry)?;

    match args.command {
        Commands::Run(cycle) => {
            let (runner, input) = build_runner(identifier, &cycle)?;
            let outcome = runner.run(&input).await?;
            println!("{}", serde_json::to_string_pretty(&summary(&runner, &outcome))?);
        }
        Commands::Prepare(cycle) => {
            let (runner, input) = build_runner(identifier, &cycle)?;
            let prepared = runner.prepare(&input)?;
            println!(
                "{} ({}) -> {}",
                prepared.model,
                prepared.method,
                prepared.background.display()
            );
        }
        Commands::Identify { input, model } => {
            let dataset = read_dataset(&input)?;
            let options = IdentifyOptions {
                model,
                ..Default::default()
            };
            let identity = identifier.identify(&dataset, &options)?;
            println!("{} ({})", identity.key(), identity.method);
        }
        Commands::Batch { inputs, model } => {
            let failures = run_batch(&identifier, &inputs, model);
            if failures > 0 {
                anyhow::bail!("{} of {} datasets failed", failures, inputs.len());
            }
        }
        Commands::ErrorStats {
            forecast,
            truth,
            output,
        } => {
            let stats = verification::error_std_dev(&read_dataset(&forecast)?, &read_dataset(&truth)?)
                .context("Failed to compute background error statistics")?;
            stats
                .to_json_file(&output)
                .with_context(|| format!("Failed to write {:?}", output))?;
            println!("{}", output.display());
        }
    }

    Ok(())
}

fn init_tracing(log_level: &str, log_format: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if log_format.eq_ignore_ascii_case("json") {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn load_registry(path: Option<&Path>) -> Result<Registry> {
    match path {
        Some(path) => Registry::from_yaml_file(path)
            .with_context(|| format!("Failed to load registry {:?}", path)),
        None => Registry::load_default().context("Failed to load model registry"),
    }
}

fn read_dataset(path: &Path) -> Result<Dataset> {
    Dataset::from_json_file(path).with_context(|| format!("Failed to read dataset {:?}", path))
}

fn build_runner(identifier: Identifier, args: &CycleArgs) -> Result<(CycleRunner, PathBuf)> {
    let mut config = match &args.config {
        Some(path) => load_cycle_config(path)?,
        None => CycleConfig::default(),
    };
    if let Some(expid) = &args.expid {
        config.expid = expid.clone();
    }
    if args.model.is_some() {
        config.input.model = args.model.clone();
    }

    let time = CycleTime::parse(&args.date, &args.cycle)?;
    let home = config.home.clone().unwrap_or_else(home_from_env);
    let paths = CyclePaths::new(home, &config.expid, time);

    let input = match &args.input {
        Some(input) => input.clone(),
        None => config
            .input
            .forecast_path(&time.date_str(), &time.cycle_str())
            .context("No input dataset: pass --input or set input.forecast in the cycle config")?,
    };

    Ok((CycleRunner::new(identifier, config, paths), input))
}

fn run_batch(identifier: &Identifier, inputs: &[PathBuf], model: Option<String>) -> usize {
    let options = IdentifyOptions {
        model,
        ..Default::default()
    };

    let mut failures = 0;
    let mut readable = Vec::new();
    let mut datasets = Vec::new();
    for input in inputs {
        match read_dataset(input) {
            Ok(dataset) => {
                readable.push(input);
                datasets.push(dataset);
            }
            Err(e) => {
                error!(input = %input.display(), error = %format!("{:#}", e), "Unreadable dataset");
                println!("{}: error: {:#}", input.display(), e);
                failures += 1;
            }
        }
    }

    let results = identifier.prepare_batch(&datasets, &options);
    for (input, result) in readable.into_iter().zip(results) {
        match result {
            Ok(prepared) => println!(
                "{}: {} ({})",
                input.display(),
                prepared.identity.key(),
                prepared.identity.method
            ),
            Err(e) => {
                println!("{}: error: {}", input.display(), e);
                failures += 1;
            }
        }
    }
    failures
}

fn summary(runner: &CycleRunner, outcome: &cycle_runner::CycleOutcome) -> serde_json::Value {
    let verification = outcome.verification.as_ref().map(|v| {
        serde_json::json!({
            "stats": v.stats,
            "alerts": v.alerts,
            "report": v.report,
        })
    });
    let sensitivity = outcome.sensitivity.as_ref().map(|s| {
        serde_json::json!({
            "variable": s.variable,
            "epsilon": s.epsilon,
            "map": s.map,
            "stats": s.stats,
        })
    });
    serde_json::json!({
        "cycle": runner.paths().time.to_string(),
        "work_dir": runner.paths().work_dir,
        "model": outcome.prepared.model,
        "method": outcome.prepared.method,
        "background": outcome.prepared.background,
        "geovals": outcome.prepared.geovals,
        "assimilated": outcome.assimilated,
        "verification": verification,
        "forecast": outcome.forecast,
        "sensitivity": sensitivity,
    })
}
