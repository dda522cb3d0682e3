//! Hpsearch Runner
//!
//! Drives hyperparameter searches on a cluster and checks what they produce.
//!
//! Architecture:
//! - Configuration: Load settings from environment or defaults
//! - Cleaner / Launcher: prepare the working directory and start the search
//! - Services: where results come from, whether the system qualifies
//! - Scheduler: pollers waiting on results tables and status files
//! - Verifier: threshold checks on the best model
//! - Scenarios: the end-to-end batch and workflow runs
//!
//! Everything runs as a single sequential task; the only concurrency is the
//! jobs the external scheduler runs on our behalf.

pub mod cleaner;
pub mod config;
pub mod error;
pub mod launcher;
pub mod scenario;
pub mod scheduler;
pub mod service;
pub mod verifier;

pub use cleaner::{CleanReport, Cleaner};
pub use config::HarnessConfig;
pub use error::{HarnessError, Result};
pub use launcher::{LaunchCommand, LaunchOutput, Launcher};
pub use scenario::{BatchSearchScenario, ScenarioOutcome, WorkflowScenario};
pub use verifier::{MetricCheck, MetricColumns, Verifier};
