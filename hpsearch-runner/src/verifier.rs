//! Result verification
//!
//! The last step of a scenario: a results table must exist and the best
//! model must beat a fixed score.

use hpsearch_core::ResultsTable;
use tracing::info;

use crate::error::{HarnessError, Result};

/// Default bar for the best test score
pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// Which columns of the results table hold the metric
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricColumns {
    /// Each of these columns that is present must clear the threshold
    Exact(Vec<String>),
    /// The best value across all columns containing this text must clear it
    Containing(String),
}

impl MetricColumns {
    /// Columns checked after a batch search
    pub fn batch_r2() -> Self {
        MetricColumns::Exact(vec![
            "test_r2_score".to_string(),
            "best_test_r2_score".to_string(),
        ])
    }

    /// Test R² only, for searches that do not report a best-test column
    pub fn test_r2() -> Self {
        MetricColumns::Exact(vec!["test_r2_score".to_string()])
    }

    /// Columns checked after a workflow search
    pub fn workflow_r2() -> Self {
        MetricColumns::Containing("test_r2_score".to_string())
    }
}

/// Best value found for a metric column
#[derive(Debug, Clone, PartialEq)]
pub struct MetricCheck {
    pub column: String,
    pub best: f64,
}

/// Checks results tables against a metric bar
#[derive(Debug, Clone)]
pub struct Verifier {
    columns: MetricColumns,
    threshold: f64,
}

impl Verifier {
    pub fn new(columns: MetricColumns, threshold: f64) -> Self {
        Self { columns, threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Verifies the outcome of a poll
    ///
    /// Fails when there is no table, when none of the designated columns
    /// holds a number, or when a best value is not strictly above the
    /// threshold. Returns the checks that passed.
    pub fn verify(&self, table: Option<&ResultsTable>) -> Result<Vec<MetricCheck>> {
        let table = table.ok_or(HarnessError::NoResults)?;

        let checks = match &self.columns {
            MetricColumns::Exact(names) => names
                .iter()
                .filter_map(|name| {
                    table.column_max(name).map(|best| MetricCheck {
                        column: name.clone(),
                        best,
                    })
                })
                .collect::<Vec<_>>(),
            MetricColumns::Containing(fragment) => table
                .columns_containing(fragment)
                .into_iter()
                .filter_map(|name| {
                    table.column_max(name).map(|best| MetricCheck {
                        column: name.to_string(),
                        best,
                    })
                })
                .max_by(|a, b| a.best.total_cmp(&b.best))
                .into_iter()
                .collect(),
        };

        if checks.is_empty() {
            return Err(HarnessError::NoMetricColumns(self.designated()));
        }

        for check in &checks {
            if check.best <= self.threshold {
                return Err(HarnessError::BelowThreshold {
                    column: check.column.clone(),
                    value: check.best,
                    threshold: self.threshold,
                });
            }
            info!(
                "{} peaked at {:.3} (threshold {})",
                check.column, check.best, self.threshold
            );
        }

        Ok(checks)
    }

    fn designated(&self) -> Vec<String> {
        match &self.columns {
            MetricColumns::Exact(names) => names.clone(),
            MetricColumns::Containing(fragment) => vec![format!("*{}*", fragment)],
        }
    }
}
