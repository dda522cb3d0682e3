//! Workflow scenario
//!
//! Runs a hyperparameter search through the workflow tool. The tool creates
//! a run folder holding a status file; the scenario follows that file until
//! every job finished, then reads the results table once and checks it.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::{self, Duration};
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use super::{ScenarioOutcome, SourceFactory, load_params, perf_results_factory, resolve};
use crate::cleaner::Cleaner;
use crate::config::HarnessConfig;
use crate::error::Result;
use crate::launcher::{LaunchCommand, Launcher};
use crate::scheduler::StatusPoller;
use crate::scheduler::status_poller::DEFAULT_RUN_FOLDER_PATTERN;
use crate::service::SystemDetector;
use crate::verifier::{MetricCheck, MetricColumns, Verifier};

/// Outcome of a workflow run
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowReport {
    pub run_folder: PathBuf,
    pub started_at: DateTime<Utc>,
    pub jobs: usize,
    pub waited: Duration,
    pub checks: Vec<MetricCheck>,
}

/// Workflow scenario
pub struct WorkflowScenario {
    config: HarnessConfig,
    detector: Arc<dyn SystemDetector>,
    params_file: PathBuf,
    generator: PathBuf,
    spec: PathBuf,
    run_folder_pattern: String,
    sources: SourceFactory,
    columns: MetricColumns,
}

impl WorkflowScenario {
    /// Creates the scenario
    ///
    /// # Arguments
    /// * `params_file` - Search configuration naming the result directory
    /// * `generator` - Parameter generator handed to the workflow tool
    /// * `spec` - Workflow specification (YAML)
    pub fn new(
        config: HarnessConfig,
        detector: Arc<dyn SystemDetector>,
        params_file: PathBuf,
        generator: PathBuf,
        spec: PathBuf,
    ) -> Self {
        Self {
            config,
            detector,
            params_file,
            generator,
            spec,
            run_folder_pattern: DEFAULT_RUN_FOLDER_PATTERN.to_string(),
            sources: perf_results_factory(),
            columns: MetricColumns::workflow_r2(),
        }
    }

    pub fn with_run_folder_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.run_folder_pattern = pattern.into();
        self
    }

    /// Replaces how results are read
    pub fn with_sources(mut self, sources: SourceFactory) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_columns(mut self, columns: MetricColumns) -> Self {
        self.columns = columns;
        self
    }

    /// Runs the workflow end to end
    pub async fn run(&self) -> Result<ScenarioOutcome<WorkflowReport>> {
        let run_id = Uuid::new_v4();
        let span = info_span!("workflow", %run_id);
        self.run_inner().instrument(span).await
    }

    async fn run_inner(&self) -> Result<ScenarioOutcome<WorkflowReport>> {
        let workdir = &self.config.workdir;
        let cleaner = Cleaner::for_workflow(workdir).with_pattern(&self.run_folder_pattern);
        cleaner.clean()?;

        if !self.detector.qualifies() {
            info!("Not a scheduler-equipped system, skipping workflow run");
            return Ok(ScenarioOutcome::Skipped);
        }

        let params = load_params(&resolve(workdir, &self.params_file))?;
        let poller = StatusPoller::from_config(&self.config, &self.run_folder_pattern)?;

        let started_at = Utc::now();
        info!("Launching workflow {}", self.spec.display());
        let command = LaunchCommand::workflow(&self.config.workflow_tool, &self.generator, &self.spec);
        Launcher::new(workdir).launch_or_empty(&command).await;

        let status = poller.wait_to_finish().await?;

        let source = (self.sources)(&params);
        let table = match source
            .collect(&resolve(workdir, &params.result_dir), params.prediction_type)
            .await
        {
            Ok(table) => Some(table),
            Err(e) => {
                warn!("{}", e);
                None
            }
        };

        let checks = Verifier::new(self.columns.clone(), self.config.threshold)
            .verify(table.as_ref())?;

        info!(
            "Waiting {:?} for the workflow tool to finish",
            self.config.settle_period
        );
        time::sleep(self.config.settle_period).await;

        cleaner.clean()?;

        Ok(ScenarioOutcome::Passed(WorkflowReport {
            run_folder: status.run_folder,
            started_at,
            jobs: status.expected_jobs,
            waited: status.waited,
            checks,
        }))
    }
}
