//! Batch command handler
//!
//! Runs one search per configuration file through the search wrapper.

use anyhow::Result;
use clap::Args;
use colored::*;
use hpsearch_runner::scenario::SearchReport;
use hpsearch_runner::{BatchSearchScenario, ScenarioOutcome};
use std::path::PathBuf;

use super::{ResultsArgs, parse_max_wait, print_checks, print_skipped};
use crate::config::Config;

/// Arguments of `hpsearch batch`
#[derive(Args)]
pub struct BatchArgs {
    /// Search configuration files, run in order (default: nn_ecfp.json nn_graphconv.json)
    configs: Vec<PathBuf>,

    /// Maximum seconds to wait per search, -1 for unlimited
    #[arg(long, allow_negative_numbers = true)]
    max_wait: Option<i64>,

    #[command(flatten)]
    results: ResultsArgs,
}

/// Handle `hpsearch batch`
pub async fn handle_batch_command(args: BatchArgs, config: &Config) -> Result<()> {
    let mut harness = config.harness.clone();
    harness.batch_max_wait = parse_max_wait(args.max_wait, harness.batch_max_wait)?;
    let threshold = harness.threshold;

    let mut scenario = BatchSearchScenario::new(harness, config.detector())
        .with_sources(args.results.factory()?);
    if !args.configs.is_empty() {
        scenario = scenario.with_config_files(args.configs);
    }

    match scenario.run().await? {
        ScenarioOutcome::Skipped => print_skipped("batch search"),
        ScenarioOutcome::Passed(reports) => {
            println!(
                "{}",
                format!("Batch search passed for {} configuration(s):", reports.len()).bold()
            );
            println!();
            for report in &reports {
                print_search_report(report, threshold);
            }
        }
    }

    Ok(())
}

/// Print a search summary
fn print_search_report(report: &SearchReport, threshold: f64) {
    println!(
        "  {} {}",
        "▸".cyan(),
        report.config_file.display().to_string().bold()
    );
    println!(
        "    Started:      {}",
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("    Submitted:    {}", report.submitted_jobs);
    println!("    Results:      {}", report.result_rows);
    println!(
        "    Waited:       {}",
        format!("{:?}", report.waited).dimmed()
    );
    print_checks(&report.checks, threshold);
    println!();
}
