//! Harness configuration
//!
//! Defines all tunable parameters of a harness run: where it runs, how often
//! it polls, how long it waits and what counts as a good enough model.

use anyhow::Context;
use hpsearch_core::MaxWait;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Harness configuration
///
/// Intervals and budgets are configurable so the same harness can run
/// against a real cluster (minutes to hours) or a local fake (milliseconds).
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Directory the search is launched from and cleaned afterwards
    pub workdir: PathBuf,

    /// How often pollers re-read results or the status file
    pub poll_interval: Duration,

    /// How often to check whether the status file has appeared
    pub status_wait_interval: Duration,

    /// Wait budget for the batch search scenario
    pub batch_max_wait: MaxWait,

    /// Wait budget for the workflow scenario
    pub workflow_max_wait: MaxWait,

    /// Metric values must be strictly above this
    pub threshold: f64,

    /// Pause after verification so the workflow tool can exit
    pub settle_period: Duration,

    /// Workflow orchestration binary
    pub workflow_tool: String,

    /// Leading status-file lines that are not jobs
    pub status_header_lines: usize,

    pub finished_marker: String,
    pub failed_marker: String,
}

impl HarnessConfig {
    /// Creates a configuration with defaults rooted at `workdir`
    pub fn new(workdir: PathBuf) -> Self {
        Self {
            workdir,
            poll_interval: Duration::from_secs(30),
            status_wait_interval: Duration::from_secs(2),
            batch_max_wait: MaxWait::Unlimited,
            workflow_max_wait: MaxWait::Limited(Duration::from_secs(2 * 60 * 60)), // 2 hours
            threshold: 0.6,
            settle_period: Duration::from_secs(60),
            workflow_tool: "maestro".to_string(),
            status_header_lines: 0,
            finished_marker: "FINISHED".to_string(),
            failed_marker: "FAILED".to_string(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - HPSEARCH_WORKDIR (default: current directory)
    /// - HPSEARCH_POLL_INTERVAL (seconds, default: 30)
    /// - HPSEARCH_STATUS_WAIT_INTERVAL (seconds, default: 2)
    /// - HPSEARCH_MAX_WAIT (seconds, -1 for unlimited; overrides both scenario budgets)
    /// - HPSEARCH_THRESHOLD (default: 0.6)
    /// - HPSEARCH_SETTLE (seconds, default: 60)
    /// - HPSEARCH_WORKFLOW_TOOL (default: maestro)
    /// - HPSEARCH_STATUS_HEADER_LINES (default: 0)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from any key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let workdir = lookup("HPSEARCH_WORKDIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut config = Self::new(workdir);

        if let Some(secs) = parse_var::<u64, _>(&lookup, "HPSEARCH_POLL_INTERVAL")? {
            config.poll_interval = Duration::from_secs(secs);
        }

        if let Some(secs) = parse_var::<u64, _>(&lookup, "HPSEARCH_STATUS_WAIT_INTERVAL")? {
            config.status_wait_interval = Duration::from_secs(secs);
        }

        if let Some(secs) = parse_var::<u64, _>(&lookup, "HPSEARCH_SETTLE")? {
            config.settle_period = Duration::from_secs(secs);
        }

        if let Some(secs) = parse_var::<i64, _>(&lookup, "HPSEARCH_MAX_WAIT")? {
            let max_wait = MaxWait::from_secs(secs)?;
            config.batch_max_wait = max_wait;
            config.workflow_max_wait = max_wait;
        }

        if let Some(threshold) = parse_var::<f64, _>(&lookup, "HPSEARCH_THRESHOLD")? {
            config.threshold = threshold;
        }

        if let Some(tool) = lookup("HPSEARCH_WORKFLOW_TOOL") {
            config.workflow_tool = tool;
        }

        if let Some(lines) = parse_var::<usize, _>(&lookup, "HPSEARCH_STATUS_HEADER_LINES")? {
            config.status_header_lines = lines;
        }

        Ok(config)
    }

    /// Overrides both scenario budgets
    pub fn with_max_wait(mut self, max_wait: MaxWait) -> Self {
        self.batch_max_wait = max_wait;
        self.workflow_max_wait = max_wait;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.status_wait_interval.is_zero() {
            anyhow::bail!("status_wait_interval must be greater than 0");
        }

        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            anyhow::bail!("threshold must be in (0, 1], got {}", self.threshold);
        }

        if self.workflow_tool.is_empty() {
            anyhow::bail!("workflow_tool cannot be empty");
        }

        if self.finished_marker.is_empty() || self.failed_marker.is_empty() {
            anyhow::bail!("status markers cannot be empty");
        }

        Ok(())
    }
}

/// Parses an optional variable; a value that is set but malformed is an error
fn parse_var<T, F>(lookup: &F, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("{}", e))
                .with_context(|| format!("{} has an invalid value '{}'", key, raw))
        })
        .transpose()
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("."))
    }
}
