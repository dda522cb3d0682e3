//! Clean command handler

use anyhow::Result;
use clap::Args;
use colored::*;
use hpsearch_runner::Cleaner;

use crate::config::Config;

/// Arguments of `hpsearch clean`
#[derive(Args)]
pub struct CleanArgs {
    /// Also remove workflow run folders
    #[arg(long)]
    workflow: bool,
}

/// Handle `hpsearch clean`
pub fn handle_clean_command(args: CleanArgs, config: &Config) -> Result<()> {
    let workdir = &config.harness.workdir;
    let cleaner = if args.workflow {
        Cleaner::for_workflow(workdir)
    } else {
        Cleaner::for_search(workdir)
    };

    let report = cleaner.clean()?;

    if report.removed.is_empty() {
        println!("{}", "Nothing to clean.".yellow());
    } else {
        println!(
            "{}",
            format!("Removed {} artifact(s):", report.removed.len()).bold()
        );
        for path in &report.removed {
            println!("  {}", path.display().to_string().dimmed());
        }
    }

    Ok(())
}
