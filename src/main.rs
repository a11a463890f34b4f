/// Benchmark Operator plugin
///
/// A Rust-based plugin for deploying the benchmark-operator to a Kubernetes
/// cluster and kicking off benchmark runs from CR files.
mod benchmark;
mod config;
mod operator;
mod steps;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::benchmark::BenchmarkRunner;
use crate::config::PluginConfig;
use crate::operator::OperatorManager;
use crate::steps::{CrParams, InputParams, StepOutput};

#[derive(Parser)]
#[command(name = "benchmark-operator-plugin")]
#[command(about = "Deploy the benchmark-operator and run benchmarks on Kubernetes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy the benchmark-operator
    Start {
        /// Step parameters file (YAML or JSON; use - for stdin)
        #[arg(short, long, default_value = "params.yaml")]
        params: PathBuf,
    },

    /// Remove the benchmark-operator
    Stop {
        /// Step parameters file (YAML or JSON; use - for stdin)
        #[arg(short, long, default_value = "params.yaml")]
        params: PathBuf,
    },

    /// Apply a benchmark CR and start a run
    Cr {
        /// Step parameters file (YAML or JSON; use - for stdin)
        #[arg(short, long, default_value = "cr-params.yaml")]
        params: PathBuf,
    },

    /// List the registered steps
    Steps,

    /// Generate example parameter files
    Init,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing on stderr; stdout carries the step result JSON
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("benchmark_operator_plugin={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Start { ref params } => run_step(&cli, "start", params).await.map(Some),
        Commands::Stop { ref params } => run_step(&cli, "stop", params).await.map(Some),
        Commands::Cr { ref params } => run_step(&cli, "cr", params).await.map(Some),
        Commands::Steps => list_steps().map(|_| None),
        Commands::Init => init_params().await.map(|_| None),
    };

    match result {
        Ok(Some(output)) if !output.is_success() => std::process::exit(1),
        Ok(_) => {}
        Err(e) => {
            error!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Run one registered step and print its result as JSON on stdout
async fn run_step(cli: &Cli, id: &str, params_path: &Path) -> Result<StepOutput> {
    let config =
        PluginConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    check_step_prerequisites(&config, id).await?;

    let params = read_params(params_path).await.with_context(|| {
        format!(
            "Failed to read step parameters from {}",
            params_path.display()
        )
    })?;

    let output = steps::dispatch(&config, id, params).await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(output)
}

/// Check that the tools a step shells out to are available
async fn check_step_prerequisites(config: &PluginConfig, id: &str) -> Result<()> {
    match id {
        "start" | "stop" => OperatorManager::check_make_installed(&config.make_bin)
            .await
            .context("make is required"),
        "cr" => BenchmarkRunner::check_kubectl_installed(&config.kubectl_bin)
            .await
            .context("kubectl is required"),
        _ => Ok(()),
    }
}

/// Read step parameters from a YAML or JSON file, or stdin when the path
/// is `-`.
async fn read_params(path: &Path) -> Result<serde_json::Value> {
    let raw = if path == Path::new("-") {
        let mut buffer = String::new();
        tokio::io::stdin().read_to_string(&mut buffer).await?;
        buffer
    } else {
        tokio::fs::read_to_string(path).await?
    };

    let params = serde_yaml::from_str(&raw)?;
    Ok(params)
}

/// List the registered steps
fn list_steps() -> Result<()> {
    info!("Registered steps:");
    for step in steps::STEPS {
        info!("  {} - {}", step.id, step.name);
        info!("      {}", step.description);
    }
    Ok(())
}

/// Generate example parameter files for the steps
async fn init_params() -> Result<()> {
    write_example(Path::new("params.yaml"), &InputParams::example()).await?;
    write_example(Path::new("cr-params.yaml"), &CrParams::example()).await?;

    info!("");
    info!("Next steps:");
    info!("  1. Point the kubeconfig fields at your cluster credentials");
    info!("  2. Deploy the operator:");
    info!("     benchmark-operator-plugin start");
    info!("  3. Run a benchmark:");
    info!("     benchmark-operator-plugin cr");

    Ok(())
}

/// Write one example parameter file, refusing to overwrite
async fn write_example<T: serde::Serialize>(path: &Path, example: &T) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Parameter file already exists: {}", path.display());
    }

    let yaml = serde_yaml::to_string(example)?;
    tokio::fs::write(path, yaml)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Example parameters created: {}", path.display());
    Ok(())
}
