//! Scenarios
//!
//! A scenario is one end-to-end harness run: clean, check the environment,
//! launch, wait, verify, clean again. Two flavours exist:
//! - `BatchSearchScenario` submits through the search wrapper and watches the results table
//! - `WorkflowScenario` submits through the workflow tool and watches its status file
//!
//! A failing step returns early and leaves the working directory as it was
//! so the artifacts can be inspected.

mod batch;
mod workflow;

pub use batch::{BatchSearchScenario, SearchReport, SearchTarget};
pub use workflow::{WorkflowReport, WorkflowScenario};

use hpsearch_core::SearchParams;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{HarnessError, Result};
use crate::service::{CommandSource, ResultsSource};

/// How a scenario run ended
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioOutcome<T> {
    /// The environment cannot run searches; nothing was launched
    Skipped,
    Passed(T),
}

impl<T> ScenarioOutcome<T> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, ScenarioOutcome::Skipped)
    }

    pub fn passed(self) -> Option<T> {
        match self {
            ScenarioOutcome::Passed(report) => Some(report),
            ScenarioOutcome::Skipped => None,
        }
    }
}

/// Picks the results source for a loaded search configuration
pub type SourceFactory = Arc<dyn Fn(&SearchParams) -> Arc<dyn ResultsSource> + Send + Sync>;

/// Factory calling the pipeline's aggregation with the configured interpreter
pub fn perf_results_factory() -> SourceFactory {
    Arc::new(|params: &SearchParams| {
        Arc::new(CommandSource::perf_results(&params.python_path)) as Arc<dyn ResultsSource>
    })
}

/// Factory returning the same source for every configuration
pub fn fixed_source(source: Arc<dyn ResultsSource>) -> SourceFactory {
    Arc::new(move |_: &SearchParams| Arc::clone(&source))
}

/// Resolves `path` against `base` unless it is absolute
pub(crate) fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Reads a search configuration file
pub fn load_params(path: &Path) -> Result<SearchParams> {
    let json = std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
    SearchParams::from_json_str(&json).map_err(|e| {
        HarnessError::Config(format!("invalid search config {}: {}", path.display(), e))
    })
}
