//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod batch;
mod clean;
mod workflow;

pub use batch::BatchArgs;
pub use clean::CleanArgs;
pub use workflow::WorkflowArgs;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use colored::*;
use hpsearch_core::MaxWait;
use hpsearch_runner::LaunchCommand;
use hpsearch_runner::scenario::{SourceFactory, fixed_source, perf_results_factory};
use hpsearch_runner::service::{CommandSource, CsvDirectorySource};
use hpsearch_runner::verifier::MetricCheck;
use std::sync::Arc;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run batch hyperparameter searches and check their results
    Batch(BatchArgs),
    /// Run a search through the workflow tool and check its results
    Workflow(WorkflowArgs),
    /// Remove search artifacts from the working directory
    Clean(CleanArgs),
}

/// Options selecting where results are read from
#[derive(Args, Debug, Clone, Default)]
pub struct ResultsArgs {
    /// Read results from CSV files under the result directory matching this glob
    #[arg(long, conflicts_with = "results_command")]
    pub results_pattern: Option<String>,

    /// Aggregation command printing CSV; `{result_dir}` and `{prediction_type}` are substituted
    #[arg(long)]
    pub results_command: Option<String>,
}

impl ResultsArgs {
    /// Builds the results source factory these options describe
    pub fn factory(&self) -> Result<SourceFactory> {
        if let Some(pattern) = &self.results_pattern {
            return Ok(fixed_source(Arc::new(CsvDirectorySource::new(pattern)?)));
        }

        if let Some(line) = &self.results_command {
            let Some(command) = LaunchCommand::parse(line) else {
                bail!("--results-command cannot be empty");
            };
            return Ok(fixed_source(Arc::new(CommandSource::new(
                command.program,
                command.args,
            ))));
        }

        Ok(perf_results_factory())
    }
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
///
/// # Returns
/// Result indicating success or failure
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Batch(args) => batch::handle_batch_command(args, config).await,
        Commands::Workflow(args) => workflow::handle_workflow_command(args, config).await,
        Commands::Clean(args) => clean::handle_clean_command(args, config),
    }
}

/// Converts a `--max-wait` value, `-1` meaning unlimited
pub(crate) fn parse_max_wait(secs: Option<i64>, default: MaxWait) -> Result<MaxWait> {
    match secs {
        Some(secs) => Ok(MaxWait::from_secs(secs)?),
        None => Ok(default),
    }
}

/// Print the metric checks of a passed search
pub(crate) fn print_checks(checks: &[MetricCheck], threshold: f64) {
    for check in checks {
        println!(
            "    {:<22} {} {}",
            check.column,
            format!("{:.3}", check.best).green(),
            format!("(> {})", threshold).dimmed()
        );
    }
}

/// Print the skip notice shared by both scenarios
pub(crate) fn print_skipped(what: &str) {
    println!(
        "{} {}",
        "SKIPPED".yellow().bold(),
        format!("{}: system does not qualify", what).dimmed()
    );
}
