//! Status-file poller
//!
//! Follows a workflow run through the status file the workflow tool keeps in
//! its run folder. The file lists one job per line; the poller counts how
//! many lines report completion and stops at the first failure.

use globset::Glob;
use hpsearch_core::{MaxWait, StatusSnapshot};
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::time::{self, Duration};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};

/// Name of the status file inside a run folder
pub const STATUS_FILE: &str = "status.csv";

/// Run folder glob used by the workflow scenario
pub const DEFAULT_RUN_FOLDER_PATTERN: &str = "Test_Maestro*";

/// Summary of a completed status poll
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub run_folder: PathBuf,
    pub expected_jobs: usize,
    pub last: StatusSnapshot,
    pub waited: Duration,
}

/// Polls a workflow status file at a fixed interval
#[derive(Debug, Clone)]
pub struct StatusPoller {
    workdir: PathBuf,
    run_folder_pattern: String,
    appear_interval: Duration,
    interval: Duration,
    max_wait: MaxWait,
    header_lines: usize,
    finished: Regex,
    failed: Regex,
}

impl StatusPoller {
    /// Creates a poller from the harness configuration
    ///
    /// Status markers are regular expressions; a plain word matches any line
    /// containing it.
    pub fn from_config(config: &HarnessConfig, run_folder_pattern: &str) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| {
                HarnessError::Config(format!("invalid status marker '{}': {}", pattern, e))
            })
        };

        Ok(Self {
            workdir: config.workdir.clone(),
            run_folder_pattern: run_folder_pattern.to_string(),
            appear_interval: config.status_wait_interval,
            interval: config.poll_interval,
            max_wait: config.workflow_max_wait,
            header_lines: config.status_header_lines,
            finished: compile(&config.finished_marker)?,
            failed: compile(&config.failed_marker)?,
        })
    }

    /// Finds the single top-level entry of the working directory matching the pattern
    pub fn locate_run_folder(&self) -> Result<PathBuf> {
        let matcher = Glob::new(&self.run_folder_pattern)
            .map_err(|e| {
                HarnessError::Config(format!(
                    "invalid run folder pattern '{}': {}",
                    self.run_folder_pattern, e
                ))
            })?
            .compile_matcher();

        let mut folders: Vec<PathBuf> = WalkDir::new(&self.workdir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| matcher.is_match(entry.file_name()))
            .map(|entry| entry.into_path())
            .collect();

        if folders.len() != 1 {
            return Err(HarnessError::RunFolder {
                pattern: self.run_folder_pattern.clone(),
                found: folders.len(),
            });
        }

        let folder = folders.remove(0);
        info!("Found run folder {}", folder.display());
        Ok(folder)
    }

    /// Waits, without bound, for a file to appear
    pub async fn wait_for_file(&self, path: &Path) {
        while !path.exists() {
            time::sleep(self.appear_interval).await;
        }
        info!("Status file {} found", path.display());
    }

    /// Reads and counts the status file
    ///
    /// Bytes that are not UTF-8 are replaced, so every line is still counted.
    pub async fn read_snapshot(&self, path: &Path) -> Result<StatusSnapshot> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| HarnessError::io(path, e))?;
        let contents = String::from_utf8_lossy(&bytes);

        Ok(StatusSnapshot::count(&contents, self.header_lines, |line| {
            (self.finished.is_match(line), self.failed.is_match(line))
        }))
    }

    /// Like [`StatusPoller::read_snapshot`], but an unreadable file counts as empty
    pub async fn snapshot(&self, path: &Path) -> StatusSnapshot {
        match self.read_snapshot(path).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!("{}", e);
                StatusSnapshot::default()
            }
        }
    }

    /// Follows a run until every job finished
    ///
    /// The job count is the number of lines in the status file when it first
    /// appears; that first read must succeed. Fails as soon as any line
    /// reports a failure, and when the wait budget runs out before every job
    /// finished.
    pub async fn wait_to_finish(&self) -> Result<StatusReport> {
        let run_folder = self.locate_run_folder()?;
        let status_file = run_folder.join(STATUS_FILE);

        self.wait_for_file(&status_file).await;

        let expected_jobs = self.read_snapshot(&status_file).await?.lines;
        info!(
            "Waiting for {} job(s) to finish, checking every {:?} (max wait: {})",
            expected_jobs, self.interval, self.max_wait
        );

        let mut last = StatusSnapshot::default();
        let mut waited = Duration::ZERO;

        while last.finished < expected_jobs && self.max_wait.allows(waited) {
            time::sleep(self.interval).await;
            waited += self.interval;

            last = self.snapshot(&status_file).await;
            info!(
                "{} job(s) finished, {} job(s) failed",
                last.finished, last.failed
            );

            if last.has_failures() {
                return Err(HarnessError::JobsFailed {
                    failed: last.failed,
                    finished: last.finished,
                });
            }
        }

        if last.finished < expected_jobs {
            return Err(HarnessError::TimedOut {
                waited,
                completed: last.finished,
                expected: expected_jobs,
            });
        }

        Ok(StatusReport {
            run_folder,
            expected_jobs,
            last,
            waited,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config(workdir: &Path, max_wait: MaxWait) -> HarnessConfig {
        let mut config = HarnessConfig::new(workdir.to_path_buf()).with_max_wait(max_wait);
        config.poll_interval = Duration::from_millis(5);
        config.status_wait_interval = Duration::from_millis(5);
        config
    }

    fn write_status(workdir: &Path, contents: &str) -> PathBuf {
        let folder = workdir.join("Test_Maestro_20240101");
        fs::create_dir_all(&folder).unwrap();
        let path = folder.join(STATUS_FILE);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_locate_requires_exactly_one_folder() {
        let tmp = TempDir::new().unwrap();
        let poller = StatusPoller::from_config(
            &config(tmp.path(), MaxWait::Unlimited),
            DEFAULT_RUN_FOLDER_PATTERN,
        )
        .unwrap();

        assert!(matches!(
            poller.locate_run_folder(),
            Err(HarnessError::RunFolder { found: 0, .. })
        ));

        fs::create_dir(tmp.path().join("Test_Maestro_a")).unwrap();
        assert!(poller.locate_run_folder().is_ok());

        fs::create_dir(tmp.path().join("Test_Maestro_b")).unwrap();
        assert!(matches!(
            poller.locate_run_folder(),
            Err(HarnessError::RunFolder { found: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_all_finished() {
        let tmp = TempDir::new().unwrap();
        write_status(tmp.path(), "job_1,FINISHED\njob_2,FINISHED\n");
        let poller = StatusPoller::from_config(
            &config(tmp.path(), MaxWait::Limited(Duration::from_secs(5))),
            DEFAULT_RUN_FOLDER_PATTERN,
        )
        .unwrap();

        let report = poller.wait_to_finish().await.unwrap();

        assert_eq!(report.expected_jobs, 2);
        assert_eq!(report.last.finished, 2);
        assert_eq!(report.waited, Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_failure_aborts_immediately() {
        let tmp = TempDir::new().unwrap();
        write_status(tmp.path(), "job_1,FAILED\njob_2,RUNNING\n");
        let poller = StatusPoller::from_config(
            &config(tmp.path(), MaxWait::Unlimited),
            DEFAULT_RUN_FOLDER_PATTERN,
        )
        .unwrap();

        let err = poller.wait_to_finish().await.unwrap_err();
        assert!(matches!(
            err,
            HarnessError::JobsFailed {
                failed: 1,
                finished: 0
            }
        ));
    }

    #[tokio::test]
    async fn test_slow_jobs_time_out() {
        let tmp = TempDir::new().unwrap();
        write_status(tmp.path(), "job_1,RUNNING\njob_2,FINISHED\n");
        let poller = StatusPoller::from_config(
            &config(tmp.path(), MaxWait::Limited(Duration::from_millis(15))),
            DEFAULT_RUN_FOLDER_PATTERN,
        )
        .unwrap();

        let err = poller.wait_to_finish().await.unwrap_err();
        match err {
            HarnessError::TimedOut {
                waited,
                completed,
                expected,
            } => {
                assert_eq!(waited, Duration::from_millis(15));
                assert_eq!(completed, 1);
                assert_eq!(expected, 2);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_header_line_is_not_a_job() {
        let tmp = TempDir::new().unwrap();
        write_status(tmp.path(), "Step Name,State\njob_1,FINISHED\n");
        let mut config = config(tmp.path(), MaxWait::Limited(Duration::from_millis(50)));
        config.status_header_lines = 1;
        let poller = StatusPoller::from_config(&config, DEFAULT_RUN_FOLDER_PATTERN).unwrap();

        let report = poller.wait_to_finish().await.unwrap();
        assert_eq!(report.expected_jobs, 1);
    }

    #[tokio::test]
    async fn test_unreadable_file_counts_as_empty() {
        let tmp = TempDir::new().unwrap();
        let poller = StatusPoller::from_config(
            &config(tmp.path(), MaxWait::Unlimited),
            DEFAULT_RUN_FOLDER_PATTERN,
        )
        .unwrap();

        let snapshot = poller.snapshot(&tmp.path().join("missing.csv")).await;
        assert_eq!(snapshot, StatusSnapshot::default());
    }

    #[tokio::test]
    async fn test_non_utf8_status_file_still_reports_failures() {
        let tmp = TempDir::new().unwrap();
        let folder = tmp.path().join("Test_Maestro_20240101");
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join(STATUS_FILE), b"job_\xff1,FAILED\njob_2,FAILED\n").unwrap();
        let poller = StatusPoller::from_config(
            &config(tmp.path(), MaxWait::Limited(Duration::from_secs(1))),
            DEFAULT_RUN_FOLDER_PATTERN,
        )
        .unwrap();

        let snapshot = poller.read_snapshot(&folder.join(STATUS_FILE)).await.unwrap();
        assert_eq!(snapshot.lines, 2);
        assert_eq!(snapshot.failed, 2);

        let err = poller.wait_to_finish().await.unwrap_err();
        assert!(matches!(
            err,
            HarnessError::JobsFailed {
                failed: 2,
                finished: 0
            }
        ));
    }

    #[tokio::test]
    async fn test_unreadable_first_read_is_error() {
        let tmp = TempDir::new().unwrap();
        // a directory named like the status file exists but cannot be read as one
        fs::create_dir_all(tmp.path().join("Test_Maestro_20240101").join(STATUS_FILE)).unwrap();
        let poller = StatusPoller::from_config(
            &config(tmp.path(), MaxWait::Limited(Duration::from_secs(1))),
            DEFAULT_RUN_FOLDER_PATTERN,
        )
        .unwrap();

        assert!(matches!(
            poller.wait_to_finish().await,
            Err(HarnessError::Io { .. })
        ));
    }

    #[test]
    fn test_invalid_marker_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let mut config = config(tmp.path(), MaxWait::Unlimited);
        config.failed_marker = "(FAILED".to_string();

        assert!(matches!(
            StatusPoller::from_config(&config, DEFAULT_RUN_FOLDER_PATTERN),
            Err(HarnessError::Config(_))
        ));
    }
}
