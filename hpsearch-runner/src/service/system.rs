//! System detection service
//!
//! Decides whether the harness is running somewhere it can actually submit
//! searches, i.e. a cluster with a batch scheduler. Elsewhere the scenarios
//! short-circuit to a trivial pass.

use tracing::{debug, info};

/// Forces detection on (`1`/`true`) or off (`0`/`false`)
pub const FORCE_VAR: &str = "HPSEARCH_FORCE_SYSTEM";

/// Variables set on scheduler-equipped cluster nodes
pub const CLUSTER_VARS: &[&str] = &["LCSCHEDCLUSTER", "SYS_TYPE"];

/// Service trait for execution-environment detection
pub trait SystemDetector: Send + Sync {
    /// Returns `true` when searches can be launched here
    fn qualifies(&self) -> bool;
}

/// Detects a cluster from its environment variables
pub struct ClusterDetector {
    lookup: Box<dyn Fn(&str) -> Option<String> + Send + Sync>,
}

impl ClusterDetector {
    /// Creates a detector reading the process environment
    pub fn from_env() -> Self {
        Self::with_lookup(|key| std::env::var(key).ok())
    }

    /// Creates a detector over an arbitrary variable lookup
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Box::new(lookup),
        }
    }
}

impl SystemDetector for ClusterDetector {
    fn qualifies(&self) -> bool {
        if let Some(forced) = (self.lookup)(FORCE_VAR) {
            match forced.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => {
                    info!("{} forces a qualifying system", FORCE_VAR);
                    return true;
                }
                "0" | "false" | "no" => {
                    info!("{} forces a non-qualifying system", FORCE_VAR);
                    return false;
                }
                other => debug!("Ignoring unrecognised {}={}", FORCE_VAR, other),
            }
        }

        let found = CLUSTER_VARS
            .iter()
            .find(|var| (self.lookup)(**var).is_some_and(|v| !v.is_empty()));

        match found {
            Some(var) => {
                debug!("Cluster detected via {}", var);
                true
            }
            None => false,
        }
    }
}

/// Detector with a fixed answer
pub struct FixedDetector(pub bool);

impl SystemDetector for FixedDetector {
    fn qualifies(&self) -> bool {
        self.0
    }
}
