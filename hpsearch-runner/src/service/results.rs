//! Results source service
//!
//! Collects the performance table of a search. The aggregation itself belongs
//! to the training pipeline; sources only know how to reach it:
//! - `CommandSource` runs an external aggregation command and reads CSV from its stdout
//! - `CsvDirectorySource` concatenates CSV summaries found under the result directory

use async_trait::async_trait;
use globset::{Glob, GlobMatcher};
use hpsearch_core::{PredictionType, ResultsTable};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{HarnessError, Result};

/// Replaced by the result directory in command arguments
pub const RESULT_DIR_PLACEHOLDER: &str = "{result_dir}";

/// Replaced by the prediction type in command arguments
pub const PREDICTION_TYPE_PLACEHOLDER: &str = "{prediction_type}";

const PERF_RESULTS_SCRIPT: &str = "\
import sys
import atomsci.ddm.pipeline.compare_models as cm
df = cm.get_filesystem_perf_results(sys.argv[1], pred_type=sys.argv[2])
df.to_csv(sys.stdout, index=False)
";

/// Service trait for reading the results table of a search
#[async_trait]
pub trait ResultsSource: Send + Sync {
    /// Reads the current results table
    ///
    /// # Arguments
    /// * `result_dir` - Directory the search writes its models to
    /// * `prediction_type` - Kind of models in the directory
    async fn collect(
        &self,
        result_dir: &Path,
        prediction_type: PredictionType,
    ) -> Result<ResultsTable>;
}

/// Runs an aggregation command and parses its stdout as CSV
#[derive(Debug, Clone)]
pub struct CommandSource {
    program: String,
    args: Vec<String>,
}

impl CommandSource {
    /// Creates a source from a program and argument templates
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Source calling the pipeline's own filesystem aggregation
    pub fn perf_results(python_path: &str) -> Self {
        Self::new(
            python_path,
            vec![
                "-c".to_string(),
                PERF_RESULTS_SCRIPT.to_string(),
                RESULT_DIR_PLACEHOLDER.to_string(),
                PREDICTION_TYPE_PLACEHOLDER.to_string(),
            ],
        )
    }

    fn render_args(&self, result_dir: &Path, prediction_type: PredictionType) -> Vec<String> {
        let result_dir = result_dir.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(RESULT_DIR_PLACEHOLDER, &result_dir)
                    .replace(PREDICTION_TYPE_PLACEHOLDER, prediction_type.as_str())
            })
            .collect()
    }
}

#[async_trait]
impl ResultsSource for CommandSource {
    async fn collect(
        &self,
        result_dir: &Path,
        prediction_type: PredictionType,
    ) -> Result<ResultsTable> {
        let args = self.render_args(result_dir, prediction_type);

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                HarnessError::Results(format!("failed to run '{}': {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HarnessError::Results(format!(
                "aggregation command exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let table = ResultsTable::from_csv_reader(output.stdout.as_slice())
            .map_err(|e| HarnessError::Results(format!("invalid CSV from aggregation: {}", e)))?;

        debug!("Aggregation command returned {} row(s)", table.len());
        Ok(table)
    }
}

/// Concatenates CSV summaries found anywhere under the result directory
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    pattern: String,
    matcher: GlobMatcher,
}

impl CsvDirectorySource {
    /// File-name glob used by [`CsvDirectorySource::default`]
    pub const DEFAULT_PATTERN: &'static str = "*perf*.csv";

    /// Creates a source matching file names against `pattern`
    pub fn new(pattern: &str) -> Result<Self> {
        let matcher = Glob::new(pattern)
            .map_err(|e| HarnessError::Config(format!("invalid results pattern '{}': {}", pattern, e)))?
            .compile_matcher();

        Ok(Self {
            pattern: pattern.to_string(),
            matcher,
        })
    }

    fn matching_files(&self, result_dir: &Path) -> Vec<PathBuf> {
        WalkDir::new(result_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| self.matcher.is_match(entry.file_name()))
            .map(|entry| entry.into_path())
            .collect()
    }
}

impl Default for CsvDirectorySource {
    fn default() -> Self {
        Self {
            pattern: Self::DEFAULT_PATTERN.to_string(),
            matcher: Glob::new(Self::DEFAULT_PATTERN)
                .expect("default results pattern is a valid glob")
                .compile_matcher(),
        }
    }
}

#[async_trait]
impl ResultsSource for CsvDirectorySource {
    async fn collect(
        &self,
        result_dir: &Path,
        _prediction_type: PredictionType,
    ) -> Result<ResultsTable> {
        if !result_dir.is_dir() {
            return Err(HarnessError::Results(format!(
                "result directory {} does not exist",
                result_dir.display()
            )));
        }

        let files = self.matching_files(result_dir);
        debug!(
            "Found {} file(s) matching '{}' under {}",
            files.len(),
            self.pattern,
            result_dir.display()
        );

        let mut tables = Vec::with_capacity(files.len());
        for path in files {
            let file = std::fs::File::open(&path).map_err(|e| HarnessError::io(&path, e))?;
            let table = ResultsTable::from_csv_reader(file).map_err(|e| {
                HarnessError::Results(format!("invalid CSV in {}: {}", path.display(), e))
            })?;
            tables.push(table);
        }

        Ok(ResultsTable::concat(tables))
    }
}
