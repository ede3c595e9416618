//! Classification stats aggregation

use commentguard_core::{Category, ClassificationOutcome};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Running counters for classified comments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Outcomes delivered to callers
    pub scanned: u64,
    pub clean: u64,
    pub offensive: u64,
    pub hate: u64,
    pub spam: u64,
    /// Application-defined category codes
    pub other: u64,
    /// Clean outcomes filled in for items missing from a batch response.
    /// Also counted in `clean`.
    pub implicit_clean: u64,
    /// Callers whose request ended in an error
    pub errors: u64,
    /// Batch calls dispatched
    pub batches: u64,
    /// Batches that fell back to per-item calls
    pub fallbacks: u64,
}

impl ScanStats {
    /// Offensive, hate and spam outcomes combined
    pub fn toxic(&self) -> u64 {
        self.offensive + self.hate + self.spam
    }

    /// Share of scanned comments that were toxic
    pub fn toxic_rate(&self) -> f64 {
        if self.scanned == 0 {
            0.0
        } else {
            self.toxic() as f64 / self.scanned as f64
        }
    }

    fn add_outcome(&mut self, outcome: &ClassificationOutcome) {
        self.scanned += 1;
        match outcome.category {
            Category::Clean => self.clean += 1,
            Category::Offensive => self.offensive += 1,
            Category::Hate => self.hate += 1,
            Category::Spam => self.spam += 1,
            Category::Other(_) => self.other += 1,
        }
        if outcome.implicit {
            self.implicit_clean += 1;
        }
    }
}

/// Thread-safe aggregator shared by the batch and fallback paths.
///
/// Cloning shares the same counters.
#[derive(Clone, Default)]
pub struct StatsAggregator {
    inner: Arc<Mutex<StatsInner>>,
}

#[derive(Default)]
struct StatsInner {
    totals: ScanStats,
    /// Accumulated since the last `take_delta`
    pending: ScanStats,
}

impl StatsInner {
    fn apply(&mut self, f: impl Fn(&mut ScanStats)) {
        f(&mut self.totals);
        f(&mut self.pending);
    }
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold delivered outcomes into the counters, one per caller
    pub fn record<'a, I>(&self, outcomes: I)
    where
        I: IntoIterator<Item = &'a ClassificationOutcome>,
    {
        let mut inner = self.inner.lock();
        for outcome in outcomes {
            inner.apply(|stats| stats.add_outcome(outcome));
        }
    }

    /// Count callers that received an error
    pub fn record_errors(&self, count: u64) {
        if count > 0 {
            self.inner.lock().apply(|stats| stats.errors += count);
        }
    }

    /// Count one dispatched batch call
    pub fn record_batch(&self) {
        self.inner.lock().apply(|stats| stats.batches += 1);
    }

    /// Count one batch that fell back to per-item calls
    pub fn record_fallback(&self) {
        self.inner.lock().apply(|stats| stats.fallbacks += 1);
    }

    /// Current totals
    pub fn snapshot(&self) -> ScanStats {
        self.inner.lock().totals
    }

    /// Counters accumulated since the previous call
    pub fn take_delta(&self) -> ScanStats {
        std::mem::take(&mut self.inner.lock().pending)
    }

    /// Zero every counter in one step
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.totals = ScanStats::default();
        inner.pending = ScanStats::default();
        debug!("Stats reset");
    }
}
