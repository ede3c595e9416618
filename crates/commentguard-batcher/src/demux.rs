//! Batch response demultiplexing
//!
//! The backend does not echo a per-item identifier by default, so results
//! are matched to buffered entries by exact text. Items the backend leaves
//! out are clean verdicts it chose not to send back.

use commentguard_client::{BatchClassifyResponse, WireResult};
use commentguard_core::ClassificationOutcome;
use commentguard_telemetry::{metrics, StatsAggregator};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::config::BatcherConfig;
use crate::pending::BufferedRequest;

/// What a demux pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemuxSummary {
    /// Entries matched to an explicit result
    pub matched: usize,
    /// Entries absent from the response, resolved as implicit clean
    pub implicit_clean: usize,
    /// Waiters resolved by this pass
    pub delivered: usize,
}

/// Resolve every entry of a flushed snapshot from a batch response.
///
/// Safe to call more than once for the same snapshot: waiters that are
/// already resolved are skipped and not counted again in `stats`.
pub fn demux(
    entries: &mut [BufferedRequest],
    response: &BatchClassifyResponse,
    config: &BatcherConfig,
    stats: &StatsAggregator,
) -> DemuxSummary {
    if response.count != response.results.len() {
        debug!(
            "Batch response count {} disagrees with {} results",
            response.count,
            response.results.len()
        );
    }

    let by_text = index_by_text(&response.results);
    let by_key = if config.match_by_key {
        index_by_key(&response.results)
    } else {
        HashMap::new()
    };

    let mut summary = DemuxSummary::default();

    for entry in entries.iter_mut() {
        let found = by_key
            .get(entry.key())
            .or_else(|| by_text.get(entry.text()))
            .copied();

        let outcome = match found {
            Some(result) => {
                summary.matched += 1;
                result.to_outcome()
            }
            None => {
                summary.implicit_clean += 1;
                ClassificationOutcome::implicit_clean(config.implicit_clean_confidence)
            }
        };

        let delivered = entry.resolve_all(Ok(outcome.clone()));
        if delivered == 0 {
            continue;
        }

        if outcome.implicit {
            warn!(
                key = entry.key(),
                "Item absent from batch response, resolving as implicit clean"
            );
        }
        stats.record(std::iter::repeat(&outcome).take(delivered));
        summary.delivered += delivered;
    }

    if summary.delivered > 0 {
        metrics::record_implicit_clean(summary.implicit_clean);
    }

    summary
}

/// First result wins when the backend returns the same text twice
fn index_by_text(results: &[WireResult]) -> HashMap<&str, &WireResult> {
    let mut index = HashMap::with_capacity(results.len());
    for result in results {
        index.entry(result.text.as_str()).or_insert(result);
    }
    index
}

fn index_by_key(results: &[WireResult]) -> HashMap<&str, &WireResult> {
    let mut index = HashMap::new();
    for result in results {
        if let Some(key) = result.client_key.as_deref() {
            index.entry(key).or_insert(result);
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::{ResultHandle, Waiter};
    use commentguard_core::{Category, CommentRequest};
    use serde_json::json;

    fn entry(key: &str, text: &str) -> (BufferedRequest, ResultHandle) {
        let (waiter, handle) = Waiter::channel(key);
        (
            BufferedRequest::new(key, CommentRequest::new(text, "web"), waiter),
            handle,
        )
    }

    fn response(value: serde_json::Value) -> BatchClassifyResponse {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_matches_by_text_and_fills_gaps() {
        let (e1, h1) = entry("web_a", "you idiot");
        let (e2, h2) = entry("web_b", "nice post");
        let mut entries = vec![e1, e2];
        let stats = StatsAggregator::new();

        let summary = demux(
            &mut entries,
            &response(json!({
                "count": 1,
                "results": [{ "text": "you idiot", "prediction": 1, "confidence": 0.88 }]
            })),
            &BatcherConfig::default(),
            &stats,
        );

        assert_eq!(summary.matched, 1);
        assert_eq!(summary.implicit_clean, 1);
        assert_eq!(summary.delivered, 2);

        let toxic = h1.await.unwrap();
        assert_eq!(toxic.category, Category::Offensive);
        assert!(!toxic.implicit);

        let gap = h2.await.unwrap();
        assert_eq!(gap.category, Category::Clean);
        assert!(gap.implicit);
        assert!((gap.confidence - 0.5).abs() < f32::EPSILON);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.scanned, 2);
        assert_eq!(snapshot.implicit_clean, 1);
    }

    #[tokio::test]
    async fn test_second_pass_is_a_no_op() {
        let (e1, h1) = entry("web_a", "spam spam");
        let mut entries = vec![e1];
        let stats = StatsAggregator::new();
        let body = response(json!({
            "count": 1,
            "results": [{ "text": "spam spam", "prediction": 3, "confidence": 0.7 }]
        }));
        let config = BatcherConfig::default();

        let first = demux(&mut entries, &body, &config, &stats);
        let second = demux(&mut entries, &body, &config, &stats);

        assert_eq!(first.delivered, 1);
        assert_eq!(second.delivered, 0);
        assert_eq!(stats.snapshot().scanned, 1);
        assert_eq!(h1.await.unwrap().category, Category::Spam);
    }

    #[tokio::test]
    async fn test_key_matching_separates_identical_texts() {
        let (e1, h1) = entry("youtube_1", "same words");
        let (e2, h2) = entry("youtube_2", "same words");
        let mut entries = vec![e1, e2];
        let config = BatcherConfig::default().with_key_matching(true);

        demux(
            &mut entries,
            &response(json!({
                "count": 2,
                "results": [
                    { "text": "same words", "client_key": "youtube_1", "prediction": 0, "confidence": 0.9 },
                    { "text": "same words", "client_key": "youtube_2", "prediction": 2, "confidence": 0.6 }
                ]
            })),
            &config,
            &StatsAggregator::new(),
        );

        assert_eq!(h1.await.unwrap().category, Category::Clean);
        assert_eq!(h2.await.unwrap().category, Category::Hate);
    }

    #[tokio::test]
    async fn test_text_matching_shares_result_for_identical_texts() {
        let (e1, h1) = entry("youtube_1", "same words");
        let (e2, h2) = entry("youtube_2", "same words");
        let mut entries = vec![e1, e2];

        demux(
            &mut entries,
            &response(json!({
                "count": 1,
                "results": [{ "text": "same words", "prediction": 2, "confidence": 0.6 }]
            })),
            &BatcherConfig::default(),
            &StatsAggregator::new(),
        );

        assert_eq!(h1.await.unwrap().category, Category::Hate);
        assert_eq!(h2.await.unwrap().category, Category::Hate);
    }
}
