//! Core domain types
//!
//! This module contains the structures exchanged between the harness and the
//! external pipeline. None of them own any I/O: callers read files or process
//! output and hand the text over.

pub mod params;
pub mod results;
pub mod status;
pub mod wait;
