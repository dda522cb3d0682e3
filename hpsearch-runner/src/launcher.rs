//! Search launcher
//!
//! Builds the command line that starts a hyperparameter search and runs it
//! as a child process of the harness:
//! - Batch searches go through the pipeline's search wrapper, which submits
//!   one scheduler job per parameter combination and prints a marker for each
//! - Workflow searches go through the workflow tool, which creates a run
//!   folder with a status file
//!
//! The launch call waits for the launching process to exit, not for the jobs
//! it submits.

use hpsearch_core::SearchParams;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{HarnessError, Result};

/// Line printed by the batch scheduler for every accepted job
pub const SUBMISSION_MARKER: &str = "Submitted batch job";

/// Program and arguments of a launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl LaunchCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// `<python> <script_dir>/utils/hyperparam_search_wrapper.py --config_file <file>`
    pub fn hyperparam_search(params: &SearchParams, config_file: &Path) -> Self {
        Self::new(params.python_path.clone())
            .arg(params.wrapper_script().to_string_lossy())
            .arg("--config_file")
            .arg(config_file.to_string_lossy())
    }

    /// `<tool> run -y -p <generator> <spec>`
    pub fn workflow(tool: &str, generator: &Path, spec: &Path) -> Self {
        Self::new(tool)
            .arg("run")
            .arg("-y")
            .arg("-p")
            .arg(generator.to_string_lossy())
            .arg(spec.to_string_lossy())
    }

    /// Splits a command line on whitespace; no quoting is interpreted
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let program = parts.next()?;
        Some(parts.fold(Self::new(program), |cmd, arg| cmd.arg(arg)))
    }
}

impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a launch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOutput {
    pub stdout: String,
    /// `None` when the process was killed by a signal or never started
    pub exit_code: Option<i32>,
}

impl LaunchOutput {
    /// Output of a launch that never happened
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of jobs the batch scheduler accepted
    pub fn submitted_jobs(&self) -> usize {
        self.stdout.matches(SUBMISSION_MARKER).count()
    }
}

/// Runs launch commands from a fixed working directory
#[derive(Debug, Clone)]
pub struct Launcher {
    workdir: PathBuf,
}

impl Launcher {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Runs the command to completion and captures its stdout
    ///
    /// stderr goes straight to the harness's stderr. A non-zero exit is
    /// logged but the captured output is still returned.
    pub async fn launch(&self, command: &LaunchCommand) -> Result<LaunchOutput> {
        info!("Launching: {}", command);

        let output = Command::new(&command.program)
            .args(&command.args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .await
            .map_err(|source| HarnessError::Launch {
                program: command.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let exit_code = output.status.code();

        if !stdout.trim().is_empty() {
            debug!("{} stdout: {}", command.program, stdout.trim());
        }

        if !output.status.success() {
            warn!(
                "Launch command exited unsuccessfully: exit_code={}",
                exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string())
            );
        }

        Ok(LaunchOutput { stdout, exit_code })
    }

    /// Like [`Launcher::launch`], but a launch that cannot start yields empty output
    pub async fn launch_or_empty(&self, command: &LaunchCommand) -> LaunchOutput {
        match self.launch(command).await {
            Ok(output) => output,
            Err(e) => {
                warn!("{}; continuing with no submitted jobs", e);
                LaunchOutput::empty()
            }
        }
    }
}
