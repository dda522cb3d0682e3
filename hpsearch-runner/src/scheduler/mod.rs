//! Scheduler layer for the harness
//!
//! This layer waits for externally scheduled jobs to finish. Both pollers
//! sleep a fixed interval between reads and count the time they slept
//! against a wait budget; neither retries or backs off.

pub mod results_poller;
pub mod status_poller;

pub use results_poller::{ResultsPollOutcome, ResultsPoller};
pub use status_poller::{StatusPoller, StatusReport};
