//! EPS CLI: the command-line driver for the endpoint supervisor.
//!
//! # Usage
//!
//! ```text
//! eps --config supervisor.yaml run < patches.jsonl
//! eps plan desired.json
//! ```

mod driver;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tokio::io::BufReader;

use endpoint_supervisor_core::types::config;
use endpoint_supervisor_core::{
    ConfigError, EndpointReconciler, LogLevel, LogLevelControl, ProcessActivator,
    RecordingActivator, SupervisorConfig,
};

#[derive(Parser, Debug)]
#[command(name = "eps")]
#[command(about = "Endpoint supervisor: reconcile endpoints from desired properties", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Supervisor config file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Initial log level (overrides the config file)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read desired-property patches from stdin, one JSON object per line
    Run,

    /// Show the backend calls one desired-property document would cause
    Plan {
        /// JSON document with desired properties
        file: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load(path)?,
        None => SupervisorConfig::default(),
    };
    let level = initial_level(cli.log_level.as_deref(), &config)?;
    let level_control: Arc<dyn LogLevelControl> =
        Arc::new(endpoint_supervisor_core::logging::init(level)?);

    match cli.command {
        Commands::Run => run(config, level_control).await,
        Commands::Plan { file } => plan(&file, level_control).await,
    }
}

/// Flag beats config; neither means `Information`.
fn initial_level(flag: Option<&str>, config: &SupervisorConfig) -> anyhow::Result<LogLevel> {
    match flag.or(config.log_level.as_deref()) {
        Some(name) => Ok(name.parse()?),
        None => Ok(LogLevel::default()),
    }
}

async fn run(config: SupervisorConfig, level: Arc<dyn LogLevelControl>) -> anyhow::Result<()> {
    let activation = config.activation.ok_or(ConfigError::MissingActivation)?;
    let activator = Arc::new(ProcessActivator::new(activation));
    let mut reconciler = EndpointReconciler::new(activator.clone(), level);

    let input = BufReader::new(tokio::io::stdin());
    let mut output = tokio::io::stdout();
    let result = driver::run(&mut reconciler, input, &mut output).await;

    activator.shutdown().await;
    let applied = result.context("patch stream failed")?;
    tracing::info!(applied, "input closed, supervisor exiting");
    Ok(())
}

async fn plan(file: &Path, level: Arc<dyn LogLevelControl>) -> anyhow::Result<()> {
    let path = file.display();
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read {path}"))?;
    let document: Value = serde_json::from_str(&content)
        .with_context(|| format!("invalid JSON in {path}"))?;
    let Value::Object(patch) = document else {
        bail!("{path}: desired properties must be a JSON object");
    };

    let backend = Arc::new(RecordingActivator::new());
    let mut reconciler = EndpointReconciler::new(backend.clone(), level);
    let report = reconciler.apply_patch(&patch).await;

    let out = json!({
        "calls": backend.calls(),
        "report": report,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
