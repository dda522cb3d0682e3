//! Workspace cleanup
//!
//! Removes the transient artifacts a search leaves in its working directory:
//! generated scripts, scheduler logs, per-run folders. Missing entries are
//! not an error, so cleaning twice is the same as cleaning once.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{HarnessError, Result};

/// Entries created by the search wrapper and the batch scheduler
pub const SEARCH_ARTIFACTS: &[&str] = &["hyperparam_search", "logs", "run.sh", "slurm_files"];

/// Folders created by the workflow tool, one per run
pub const WORKFLOW_RUN_PATTERN: &str = "Test_Maestro_*";

/// What a clean pass removed
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanReport {
    pub removed: Vec<PathBuf>,
}

/// Removes a fixed set of entries from one directory
#[derive(Debug, Clone)]
pub struct Cleaner {
    root: PathBuf,
    names: Vec<String>,
    patterns: Vec<String>,
}

impl Cleaner {
    /// Creates a cleaner with nothing registered
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            names: Vec::new(),
            patterns: Vec::new(),
        }
    }

    /// Cleaner for the batch search scenario
    pub fn for_search(root: impl Into<PathBuf>) -> Self {
        SEARCH_ARTIFACTS
            .iter()
            .fold(Self::new(root), |cleaner, name| cleaner.with_entry(*name))
    }

    /// Cleaner for the workflow scenario: search artifacts plus run folders
    pub fn for_workflow(root: impl Into<PathBuf>) -> Self {
        Self::for_search(root).with_pattern(WORKFLOW_RUN_PATTERN)
    }

    /// Registers an entry by name, file or directory
    pub fn with_entry(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    /// Registers a glob matched against top-level entry names
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Removes every registered entry that exists
    pub fn clean(&self) -> Result<CleanReport> {
        let mut report = CleanReport::default();

        for name in &self.names {
            let path = self.root.join(name);
            if remove_entry(&path)? {
                report.removed.push(path);
            }
        }

        if !self.patterns.is_empty() && self.root.is_dir() {
            let matcher = self.build_matcher()?;

            let matched: Vec<PathBuf> = WalkDir::new(&self.root)
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|entry| matcher.is_match(entry.file_name()))
                .map(|entry| entry.into_path())
                .collect();

            for path in matched {
                if remove_entry(&path)? {
                    report.removed.push(path);
                }
            }
        }

        if report.removed.is_empty() {
            debug!("Nothing to clean in {}", self.root.display());
        } else {
            info!(
                "Removed {} artifact(s) from {}",
                report.removed.len(),
                self.root.display()
            );
        }

        Ok(report)
    }

    fn build_matcher(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.patterns {
            let glob = Glob::new(pattern).map_err(|e| {
                HarnessError::Config(format!("invalid cleanup pattern '{}': {}", pattern, e))
            })?;
            builder.add(glob);
        }
        builder
            .build()
            .map_err(|e| HarnessError::Config(format!("invalid cleanup patterns: {}", e)))
    }
}

/// Removes a file or directory tree; returns whether anything was there
fn remove_entry(path: &Path) -> Result<bool> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(HarnessError::io(path, e)),
    };

    let removed = if metadata.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };

    match removed {
        Ok(()) => {
            debug!("Removed {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(HarnessError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn populate(dir: &Path) {
        fs::create_dir_all(dir.join("hyperparam_search/run_1")).unwrap();
        fs::write(dir.join("hyperparam_search/run_1/model.pkl"), "x").unwrap();
        fs::create_dir(dir.join("logs")).unwrap();
        fs::create_dir(dir.join("slurm_files")).unwrap();
        fs::write(dir.join("run.sh"), "#!/bin/sh\n").unwrap();
        fs::write(dir.join("nn_ecfp.json"), "{}").unwrap();
    }

    #[test]
    fn test_removes_search_artifacts() {
        let tmp = TempDir::new().unwrap();
        populate(tmp.path());

        let report = Cleaner::for_search(tmp.path()).clean().unwrap();

        assert_eq!(report.removed.len(), 4);
        for name in SEARCH_ARTIFACTS {
            assert!(!tmp.path().join(name).exists(), "{} still present", name);
        }
        assert!(tmp.path().join("nn_ecfp.json").exists());
    }

    #[test]
    fn test_clean_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        populate(tmp.path());

        let cleaner = Cleaner::for_search(tmp.path());
        cleaner.clean().unwrap();
        let second = cleaner.clean().unwrap();

        assert!(second.removed.is_empty());
    }

    #[test]
    fn test_missing_root_is_not_an_error() {
        let tmp = TempDir::new().unwrap();
        let report = Cleaner::for_workflow(tmp.path().join("gone")).clean().unwrap();
        assert!(report.removed.is_empty());
    }

    #[test]
    fn test_workflow_pattern_removes_run_folders() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("Test_Maestro_20240101-120000")).unwrap();
        fs::create_dir(tmp.path().join("Test_Maestro_20240102-080000")).unwrap();
        fs::create_dir(tmp.path().join("Keep_Maestro")).unwrap();

        let report = Cleaner::for_workflow(tmp.path()).clean().unwrap();

        assert_eq!(report.removed.len(), 2);
        assert!(tmp.path().join("Keep_Maestro").exists());
    }

    #[test]
    fn test_search_cleaner_leaves_run_folders() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("Test_Maestro_1")).unwrap();

        Cleaner::for_search(tmp.path()).clean().unwrap();

        assert!(tmp.path().join("Test_Maestro_1").exists());
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let result = Cleaner::new(tmp.path()).with_pattern("[unclosed").clean();
        assert!(matches!(result, Err(HarnessError::Config(_))));
    }
}
