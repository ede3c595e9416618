//! Per-item fallback path

use commentguard_client::{ClassificationBackend, ClassifyRequest, WireItem};
use commentguard_telemetry::{metrics, StatsAggregator};
use futures::future::join_all;
use std::time::Instant;
use tracing::{debug, error};

use crate::config::BatcherConfig;
use crate::pending::BufferedRequest;

/// What a fallback pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FallbackSummary {
    /// Entries classified successfully
    pub succeeded: usize,
    /// Entries whose single-item call failed
    pub failed: usize,
    /// Waiters resolved by this pass
    pub delivered: usize,
}

/// Classify every entry with its own single-item call.
///
/// Calls run concurrently; each entry's waiters get that entry's own result,
/// so a failure is confined to the item that caused it.
pub async fn retry_individually(
    backend: &dyn ClassificationBackend,
    entries: &mut [BufferedRequest],
    config: &BatcherConfig,
    stats: &StatsAggregator,
) -> FallbackSummary {
    let calls = entries.iter().map(|entry| {
        let request = ClassifyRequest {
            item: WireItem::from_request(entry.request()),
            store_clean: config.store_clean,
            persist: config.persist,
        };
        async move {
            let start = Instant::now();
            let result = backend.classify(&request).await;
            metrics::record_dispatch_latency("single", start.elapsed().as_micros() as u64);
            result
        }
    });
    let results = join_all(calls).await;

    let mut summary = FallbackSummary::default();

    for (entry, result) in entries.iter_mut().zip(results) {
        match result {
            Ok(outcome) => {
                summary.succeeded += 1;
                let delivered = entry.resolve_all(Ok(outcome.clone()));
                stats.record(std::iter::repeat(&outcome).take(delivered));
                summary.delivered += delivered;
            }
            Err(err) => {
                summary.failed += 1;
                error!(key = entry.key(), "Single-item classification failed: {}", err);
                metrics::record_item_failure(err.kind());
                let delivered = entry.resolve_all(Err(err));
                stats.record_errors(delivered as u64);
                summary.delivered += delivered;
            }
        }
    }

    debug!(
        "Fallback finished: {} succeeded, {} failed",
        summary.succeeded, summary.failed
    );
    summary
}
