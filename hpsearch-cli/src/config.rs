//! Configuration module
//!
//! Merges environment configuration with command-line overrides.

use anyhow::{Context, Result};
use hpsearch_runner::HarnessConfig;
use hpsearch_runner::service::{ClusterDetector, FixedDetector, SystemDetector};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Harness settings shared by all commands
    pub harness: HarnessConfig,

    /// Skip system detection
    pub force_system: bool,
}

impl Config {
    /// Loads the environment configuration and applies global flags
    pub fn load(
        workdir: Option<PathBuf>,
        poll_interval: Option<u64>,
        threshold: Option<f64>,
        force_system: bool,
    ) -> Result<Self> {
        let mut harness =
            HarnessConfig::from_env().context("Failed to load configuration from environment")?;

        if let Some(workdir) = workdir {
            harness.workdir = workdir;
        }
        if let Some(secs) = poll_interval {
            harness.poll_interval = Duration::from_secs(secs);
        }
        if let Some(threshold) = threshold {
            harness.threshold = threshold;
        }

        harness.validate()?;

        Ok(Self {
            harness,
            force_system,
        })
    }

    /// Detector honouring `--force-system`
    pub fn detector(&self) -> Arc<dyn SystemDetector> {
        if self.force_system {
            Arc::new(FixedDetector(true))
        } else {
            Arc::new(ClusterDetector::from_env())
        }
    }
}
