//! Batch search scenario
//!
//! Runs one hyperparameter search per configuration file through the
//! pipeline's search wrapper. The wrapper submits every parameter
//! combination to the batch scheduler and prints one submission line per
//! job; the scenario then waits for the results table to hold that many rows.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use super::{ScenarioOutcome, SourceFactory, load_params, perf_results_factory, resolve};
use crate::cleaner::Cleaner;
use crate::config::HarnessConfig;
use crate::error::Result;
use crate::launcher::{LaunchCommand, Launcher};
use crate::scheduler::ResultsPoller;
use crate::service::SystemDetector;
use crate::verifier::{MetricCheck, MetricColumns, Verifier};

/// Configuration files searched when none are given
pub const DEFAULT_CONFIG_FILES: &[&str] = &["nn_ecfp.json", "nn_graphconv.json"];

/// A configuration file and the metric columns its results are checked on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTarget {
    pub config_file: PathBuf,
    pub columns: MetricColumns,
}

impl SearchTarget {
    /// Target checked on both the test and best-test R² columns
    pub fn new(config_file: impl Into<PathBuf>) -> Self {
        Self {
            config_file: config_file.into(),
            columns: MetricColumns::batch_r2(),
        }
    }

    pub fn with_columns(mut self, columns: MetricColumns) -> Self {
        self.columns = columns;
        self
    }

    /// ECFP search on both R² columns, graph-convolution search on test R² only
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(DEFAULT_CONFIG_FILES[0]),
            Self::new(DEFAULT_CONFIG_FILES[1]).with_columns(MetricColumns::test_r2()),
        ]
    }
}

/// Outcome of one search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    pub config_file: PathBuf,
    pub started_at: DateTime<Utc>,
    pub submitted_jobs: usize,
    pub result_rows: usize,
    pub waited: Duration,
    pub checks: Vec<MetricCheck>,
}

/// Batch search scenario
pub struct BatchSearchScenario {
    config: HarnessConfig,
    detector: Arc<dyn SystemDetector>,
    targets: Vec<SearchTarget>,
    sources: SourceFactory,
}

impl BatchSearchScenario {
    /// Creates the scenario with the default configuration files
    pub fn new(config: HarnessConfig, detector: Arc<dyn SystemDetector>) -> Self {
        Self {
            config,
            detector,
            targets: SearchTarget::defaults(),
            sources: perf_results_factory(),
        }
    }

    /// Replaces the configuration files to search, run in order
    ///
    /// Each file is checked on both R² columns.
    pub fn with_config_files(mut self, files: Vec<PathBuf>) -> Self {
        self.targets = files.into_iter().map(SearchTarget::new).collect();
        self
    }

    pub fn with_targets(mut self, targets: Vec<SearchTarget>) -> Self {
        self.targets = targets;
        self
    }

    /// Replaces how results are read
    pub fn with_sources(mut self, sources: SourceFactory) -> Self {
        self.sources = sources;
        self
    }

    /// Checks every configuration file on the same columns
    pub fn with_columns(mut self, columns: MetricColumns) -> Self {
        for target in &mut self.targets {
            target.columns = columns.clone();
        }
        self
    }

    /// Runs every configured search
    pub async fn run(&self) -> Result<ScenarioOutcome<Vec<SearchReport>>> {
        let run_id = Uuid::new_v4();
        let span = info_span!("batch_search", %run_id);
        self.run_inner().instrument(span).await
    }

    async fn run_inner(&self) -> Result<ScenarioOutcome<Vec<SearchReport>>> {
        let cleaner = Cleaner::for_search(&self.config.workdir);
        cleaner.clean()?;

        if !self.detector.qualifies() {
            info!("Not a scheduler-equipped system, skipping batch search");
            return Ok(ScenarioOutcome::Skipped);
        }

        let launcher = Launcher::new(&self.config.workdir);
        let mut reports = Vec::with_capacity(self.targets.len());

        for target in &self.targets {
            let verifier = Verifier::new(target.columns.clone(), self.config.threshold);
            let report = self
                .search(&target.config_file, &launcher, &verifier)
                .await?;
            reports.push(report);
            cleaner.clean()?;
        }

        info!("Batch search passed for {} configuration(s)", reports.len());
        Ok(ScenarioOutcome::Passed(reports))
    }

    async fn search(
        &self,
        config_file: &Path,
        launcher: &Launcher,
        verifier: &Verifier,
    ) -> Result<SearchReport> {
        let workdir = &self.config.workdir;
        let params = load_params(&resolve(workdir, config_file))?;

        let started_at = Utc::now();
        info!("Starting search for {}", config_file.display());
        let command = LaunchCommand::hyperparam_search(&params, config_file);
        let output = launcher.launch_or_empty(&command).await;
        let submitted_jobs = output.submitted_jobs();

        let poller = ResultsPoller::new(
            (self.sources)(&params),
            self.config.poll_interval,
            self.config.batch_max_wait,
        );
        let outcome = poller
            .wait_for(
                submitted_jobs,
                &resolve(workdir, &params.result_dir),
                params.prediction_type,
            )
            .await;

        let checks = verifier.verify(outcome.table.as_ref())?;

        Ok(SearchReport {
            config_file: config_file.to_path_buf(),
            started_at,
            submitted_jobs,
            result_rows: outcome.rows(),
            waited: outcome.waited,
            checks,
        })
    }
}
