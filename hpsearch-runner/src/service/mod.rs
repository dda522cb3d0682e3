//! Service layer
//!
//! Services are the harness's seams to the outside world: where results
//! come from and whether the environment can run a search at all.
//!
//! All services are trait-based so scenarios can be driven by fakes in tests.

mod results;
mod system;

// Re-export traits
pub use results::ResultsSource;
pub use system::SystemDetector;

// Re-export implementations
pub use results::{CommandSource, CsvDirectorySource};
pub use system::{ClusterDetector, FixedDetector};
