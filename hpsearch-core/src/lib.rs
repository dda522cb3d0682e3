//! Hpsearch Core
//!
//! Core types shared by the hyperparameter-search integration harness.
//!
//! This crate contains:
//! - Domain types: search parameters, wait budgets, results tables and
//!   status-file snapshots
//!
//! Note: process launching and polling live in the runner crate.

pub mod domain;

pub use domain::params::{PredictionType, SearchParams};
pub use domain::results::ResultsTable;
pub use domain::status::StatusSnapshot;
pub use domain::wait::MaxWait;
