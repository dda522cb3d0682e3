//! Error types for the harness

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors that can stop a harness run
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Filesystem operation failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be loaded or is invalid
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Child process could not be started
    #[error("Failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Results could not be collected
    #[error("Failed to read results: {0}")]
    Results(String),

    /// Workflow run folder is missing or ambiguous
    #[error("Expected exactly one run folder matching '{pattern}', found {found}")]
    RunFolder { pattern: String, found: usize },

    /// A job reported a failed state
    #[error("{failed} job(s) failed ({finished} finished)")]
    JobsFailed { failed: usize, finished: usize },

    /// Jobs did not complete within the wait budget
    #[error("Timed out after {waited:?}: {completed} of {expected} job(s) completed")]
    TimedOut {
        waited: Duration,
        completed: usize,
        expected: usize,
    },

    /// Polling ended without a results table
    #[error("No results table was produced")]
    NoResults,

    /// None of the designated metric columns hold numeric values
    #[error("No numeric values in metric columns {0:?}")]
    NoMetricColumns(Vec<String>),

    /// A metric did not clear the threshold
    #[error("Metric '{column}' peaked at {value}, expected more than {threshold}")]
    BelowThreshold {
        column: String,
        value: f64,
        threshold: f64,
    },
}

impl HarnessError {
    /// Wraps an I/O error with the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if this error is a verification failure rather than a harness fault
    pub fn is_assertion(&self) -> bool {
        matches!(
            self,
            Self::JobsFailed { .. }
                | Self::TimedOut { .. }
                | Self::NoResults
                | Self::NoMetricColumns(_)
                | Self::BelowThreshold { .. }
        )
    }
}
