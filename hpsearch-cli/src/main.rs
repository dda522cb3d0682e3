//! Hpsearch CLI
//!
//! Command-line interface for running the hyperparameter-search harness.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use colored::*;
use config::Config;
use hpsearch_runner::HarnessError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hpsearch")]
#[command(about = "Hyperparameter search integration harness", long_about = None)]
struct Cli {
    /// Directory searches are launched from and cleaned
    #[arg(long, env = "HPSEARCH_WORKDIR")]
    workdir: Option<PathBuf>,

    /// Seconds between polls
    #[arg(long)]
    poll_interval: Option<u64>,

    /// Best metric value must be strictly above this
    #[arg(long)]
    threshold: Option<f64>,

    /// Run even when the system is not detected as a cluster
    #[arg(long)]
    force_system: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hpsearch=info,hpsearch_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // reported once: verification failures as a verdict, anything else as an error log
            if is_verification_failure(&e) {
                eprintln!("{} {:#}", "FAILED".red().bold(), e);
            } else {
                tracing::error!("{:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.workdir, cli.poll_interval, cli.threshold, cli.force_system)?;
    handle_command(cli.command, &config).await
}

/// Whether the harness ran but the search did not meet expectations
fn is_verification_failure(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<HarnessError>()
        .is_some_and(HarnessError::is_assertion)
}
