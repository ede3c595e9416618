//! CommentGuard Telemetry
//!
//! Provides:
//! - Running classification counters exposed to the extension UI
//! - Deltas for an external stats persistence collaborator
//! - Prometheus metric names and recording helpers

pub mod metrics;
pub mod stats;

pub use stats::{ScanStats, StatsAggregator};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::stats::{ScanStats, StatsAggregator};
}
