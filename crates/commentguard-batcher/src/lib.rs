//! CommentGuard Batcher
//!
//! Coalesces classification requests arriving from many content scripts into
//! bounded batches and dispatches them to the classification backend.
//!
//! Request lifecycle:
//! - [`Batcher::submit`] validates the text, collapses duplicates onto the
//!   buffered entry for the same dedup key, and returns a [`ResultHandle`]
//! - The buffer is flushed when it reaches `batch_size` or when the flush
//!   timer armed by the first request of the window fires
//! - The flushed snapshot goes out as one batch call; responses are matched
//!   back to entries and every waiter of an entry gets the same outcome
//! - If the batch call fails, each entry is retried on its own so one bad
//!   item cannot fail the others

pub mod batcher;
pub mod config;
pub mod demux;
pub mod fallback;
pub mod handle;
pub mod pending;

pub use batcher::{Batcher, DispatchPath, FlushReport, FlushTrigger};
pub use config::BatcherConfig;
pub use demux::{demux, DemuxSummary};
pub use fallback::{retry_individually, FallbackSummary};
pub use handle::{ResultHandle, Waiter};
pub use pending::BufferedRequest;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::batcher::{Batcher, FlushReport};
    pub use crate::config::BatcherConfig;
    pub use crate::handle::ResultHandle;
}
