//! Results poller
//!
//! Re-reads the results table of a batch search until it holds a row for
//! every submitted job or the wait budget runs out.

use hpsearch_core::{MaxWait, PredictionType, ResultsTable};
use std::path::Path;
use std::sync::Arc;
use tokio::time::{self, Duration};
use tracing::{debug, info};

use crate::service::ResultsSource;

/// What a results poll ended with
#[derive(Debug, Clone)]
pub struct ResultsPollOutcome {
    /// Table from the last read, `None` if that read failed or nothing was read
    pub table: Option<ResultsTable>,
    /// Sum of the intervals slept
    pub waited: Duration,
    pub polls: u32,
}

impl ResultsPollOutcome {
    /// Rows in the last table read
    pub fn rows(&self) -> usize {
        self.table.as_ref().map_or(0, ResultsTable::len)
    }
}

/// Polls a results source at a fixed interval
pub struct ResultsPoller {
    source: Arc<dyn ResultsSource>,
    interval: Duration,
    max_wait: MaxWait,
}

impl ResultsPoller {
    /// Creates a new results poller
    pub fn new(source: Arc<dyn ResultsSource>, interval: Duration, max_wait: MaxWait) -> Self {
        Self {
            source,
            interval,
            max_wait,
        }
    }

    /// Waits until the results table has at least `expected_jobs` rows
    ///
    /// Sleeps before every read. A failed read counts as zero rows and
    /// discards the previous table. Stops once enough rows were read or the
    /// time slept is no longer below the wait budget.
    pub async fn wait_for(
        &self,
        expected_jobs: usize,
        result_dir: &Path,
        prediction_type: PredictionType,
    ) -> ResultsPollOutcome {
        info!(
            "Waiting for {} job(s) to finish, checking every {:?} (max wait: {})",
            expected_jobs, self.interval, self.max_wait
        );

        let mut outcome = ResultsPollOutcome {
            table: None,
            waited: Duration::ZERO,
            polls: 0,
        };
        let mut found = 0;

        while found < expected_jobs && self.max_wait.allows(outcome.waited) {
            time::sleep(self.interval).await;
            outcome.waited += self.interval;
            outcome.polls += 1;

            match self.source.collect(result_dir, prediction_type).await {
                Ok(table) => {
                    found = table.len();
                    outcome.table = Some(table);
                }
                Err(e) => {
                    debug!("Results not readable yet: {}", e);
                    found = 0;
                    outcome.table = None;
                }
            }

            debug!(
                "Poll {}: {} of {} result(s) after {:?}",
                outcome.polls, found, expected_jobs, outcome.waited
            );
        }

        if found >= expected_jobs && expected_jobs > 0 {
            info!("All {} job(s) reported results after {:?}", found, outcome.waited);
        } else {
            info!(
                "Stopped waiting with {} of {} result(s) after {:?}",
                found, expected_jobs, outcome.waited
            );
        }

        outcome
    }
}
