//! Workflow command handler
//!
//! Runs a search through the workflow tool and follows its status file.

use anyhow::Result;
use clap::Args;
use colored::*;
use hpsearch_runner::scheduler::status_poller::DEFAULT_RUN_FOLDER_PATTERN;
use hpsearch_runner::{ScenarioOutcome, WorkflowScenario};
use std::path::PathBuf;

use super::{ResultsArgs, parse_max_wait, print_checks, print_skipped};
use crate::config::Config;

/// Arguments of `hpsearch workflow`
#[derive(Args)]
pub struct WorkflowArgs {
    /// Search configuration naming the result directory
    #[arg(long, default_value = "nn_ecfp.json")]
    config: PathBuf,

    /// Parameter generator passed to the workflow tool
    #[arg(long, default_value = "custom_gen.py")]
    generator: PathBuf,

    /// Workflow specification
    #[arg(long, default_value = "run_nn_ecfp.yaml")]
    spec: PathBuf,

    /// Glob matching the run folder the workflow tool creates
    #[arg(long, default_value = DEFAULT_RUN_FOLDER_PATTERN)]
    run_folder: String,

    /// Maximum seconds to wait for the jobs, -1 for unlimited
    #[arg(long, allow_negative_numbers = true)]
    max_wait: Option<i64>,

    #[command(flatten)]
    results: ResultsArgs,
}

/// Handle `hpsearch workflow`
pub async fn handle_workflow_command(args: WorkflowArgs, config: &Config) -> Result<()> {
    let mut harness = config.harness.clone();
    harness.workflow_max_wait = parse_max_wait(args.max_wait, harness.workflow_max_wait)?;
    let threshold = harness.threshold;

    let scenario = WorkflowScenario::new(
        harness,
        config.detector(),
        args.config,
        args.generator,
        args.spec.clone(),
    )
    .with_run_folder_pattern(args.run_folder)
    .with_sources(args.results.factory()?);

    match scenario.run().await? {
        ScenarioOutcome::Skipped => print_skipped("workflow"),
        ScenarioOutcome::Passed(report) => {
            println!(
                "{}",
                format!("Workflow {} passed:", args.spec.display()).bold()
            );
            println!();
            println!(
                "  {} {}",
                "▸".cyan(),
                report.run_folder.display().to_string().bold()
            );
            println!(
                "    Started:      {}",
                report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!("    Jobs:         {}", report.jobs);
            println!(
                "    Waited:       {}",
                format!("{:?}", report.waited).dimmed()
            );
            print_checks(&report.checks, threshold);
        }
    }

    Ok(())
}
