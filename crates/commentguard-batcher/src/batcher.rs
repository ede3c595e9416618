//! Batch accumulator and dispatcher

use commentguard_client::{BatchClassifyRequest, ClassificationBackend, WireItem};
use commentguard_core::{ClassificationOutcome, CommentRequest, Error, Result};
use commentguard_telemetry::{metrics, ScanStats, StatsAggregator};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use crate::config::BatcherConfig;
use crate::demux::demux;
use crate::fallback::retry_individually;
use crate::handle::{ResultHandle, Waiter};
use crate::pending::{BufferedRequest, Insertion, PendingBuffer};

/// What caused a flush
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlushTrigger {
    /// The buffer reached `batch_size`
    Size,
    /// The flush interval elapsed
    Timer,
    /// `flush_now` was called
    Manual,
}

impl FlushTrigger {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::Timer => "timer",
            Self::Manual => "manual",
        }
    }
}

/// How a flushed snapshot was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchPath {
    /// Nothing was buffered
    Empty,
    /// The batch call succeeded
    Batch,
    /// The batch call failed and items were retried one by one
    Fallback,
    /// The batch call failed with an error surfaced to every caller
    Rejected,
}

/// Summary of one flush cycle
#[derive(Debug, Clone, Serialize)]
pub struct FlushReport {
    pub trigger: FlushTrigger,
    pub path: DispatchPath,
    /// Distinct items in the snapshot
    pub items: usize,
    /// Callers resolved, counting duplicates
    pub waiters: usize,
    /// Items resolved as clean because the response omitted them
    pub implicit_clean: usize,
    /// Items whose caller received an error
    pub failed: usize,
}

impl FlushReport {
    fn empty(trigger: FlushTrigger) -> Self {
        Self {
            trigger,
            path: DispatchPath::Empty,
            items: 0,
            waiters: 0,
            implicit_clean: 0,
            failed: 0,
        }
    }
}

/// Coalesces classification requests into batches.
///
/// Cloning shares the same buffer, timer and stats.
#[derive(Clone)]
pub struct Batcher {
    inner: Arc<BatcherInner>,
}

struct BatcherInner {
    config: BatcherConfig,
    backend: Arc<dyn ClassificationBackend>,
    stats: StatsAggregator,
    runtime: Handle,

    /// Buffer and timer; held only for in-memory bookkeeping, never across I/O
    state: Mutex<PendingBuffer>,

    /// Serializes dispatch so one batch is in flight at a time
    flight: tokio::sync::Mutex<()>,
}

impl Batcher {
    /// Create a batcher with its own stats aggregator.
    ///
    /// Must be called from within a tokio runtime; timers and size-triggered
    /// dispatches are spawned onto it.
    pub fn new(config: BatcherConfig, backend: Arc<dyn ClassificationBackend>) -> Result<Self> {
        Self::with_stats(config, backend, StatsAggregator::new())
    }

    /// Create a batcher that records into an existing aggregator
    pub fn with_stats(
        config: BatcherConfig,
        backend: Arc<dyn ClassificationBackend>,
        stats: StatsAggregator,
    ) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current()
            .map_err(|_| Error::config("batcher must be created inside a tokio runtime"))?;

        info!(
            "Batcher ready: backend={}, batch_size={}, flush_interval={}ms",
            backend.name(),
            config.batch_size,
            config.flush_interval_ms
        );

        Ok(Self {
            inner: Arc::new(BatcherInner {
                config,
                backend,
                stats,
                runtime,
                state: Mutex::new(PendingBuffer::default()),
                flight: tokio::sync::Mutex::new(()),
            }),
        })
    }

    /// Queue a request for classification.
    ///
    /// Only fails for invalid input. The returned handle resolves once the
    /// batch containing the request has been classified.
    pub fn submit(&self, request: CommentRequest) -> Result<ResultHandle> {
        request.validate()?;

        let key = request.dedup_key();
        let (waiter, handle) = Waiter::channel(key.clone());
        let inner = &self.inner;

        let size_flush = {
            let mut state = inner.state.lock();

            let insertion = state.insert(key, request, waiter);
            metrics::record_submission(insertion == Insertion::Duplicate);
            if insertion == Insertion::Duplicate {
                debug!(key = handle.key(), "Collapsed duplicate submission");
            }

            if state.len() >= inner.config.batch_size {
                Some(state.take(true))
            } else {
                if !state.timer_armed() {
                    inner.arm_timer(&mut state);
                }
                None
            }
        };

        if let Some(entries) = size_flush {
            debug!("Batch size reached, flushing {} items", entries.len());
            let inner = Arc::clone(inner);
            inner.runtime.clone().spawn(async move {
                inner.dispatch(entries, FlushTrigger::Size).await;
            });
        }

        Ok(handle)
    }

    /// Drain the buffer now and wait for the resulting dispatch.
    ///
    /// A no-op when nothing is buffered. The dispatch runs as its own task,
    /// so dropping the returned future does not lose the drained snapshot.
    pub async fn flush_now(&self) -> FlushReport {
        let entries = self.inner.state.lock().take(true);
        if entries.is_empty() {
            return FlushReport::empty(FlushTrigger::Manual);
        }

        let items = entries.len();
        let inner = Arc::clone(&self.inner);
        let task = self.inner.runtime.spawn(async move {
            inner.dispatch(entries, FlushTrigger::Manual).await
        });

        match task.await {
            Ok(report) => report,
            Err(e) => {
                error!("Manual flush task failed: {}", e);
                FlushReport {
                    path: DispatchPath::Rejected,
                    items,
                    failed: items,
                    ..FlushReport::empty(FlushTrigger::Manual)
                }
            }
        }
    }

    /// Classify one request without batching, through the per-item path
    pub async fn classify_unbatched(&self, request: CommentRequest) -> Result<ClassificationOutcome> {
        request.validate()?;

        let key = request.dedup_key();
        let (waiter, handle) = Waiter::channel(key.clone());
        let mut entries = [BufferedRequest::new(key, request, waiter)];
        metrics::record_submission(false);

        retry_individually(
            self.inner.backend.as_ref(),
            &mut entries,
            &self.inner.config,
            &self.inner.stats,
        )
        .await;

        handle.await
    }

    /// Current counters
    pub fn stats(&self) -> ScanStats {
        self.inner.stats.snapshot()
    }

    /// Zero the counters
    pub fn reset_stats(&self) {
        self.inner.stats.reset();
    }

    /// Counters accumulated since the previous call, for persistence
    pub fn take_stats_delta(&self) -> ScanStats {
        self.inner.stats.take_delta()
    }

    pub fn stats_aggregator(&self) -> &StatsAggregator {
        &self.inner.stats
    }

    /// Distinct items currently buffered
    pub fn pending_len(&self) -> usize {
        self.inner.state.lock().len()
    }

    /// Whether a deferred flush is scheduled
    pub fn timer_armed(&self) -> bool {
        self.inner.state.lock().timer_armed()
    }

    pub fn config(&self) -> &BatcherConfig {
        &self.inner.config
    }
}

impl BatcherInner {
    /// Schedule the deferred flush. Caller holds the state lock.
    fn arm_timer(self: &Arc<Self>, state: &mut PendingBuffer) {
        let epoch = state.next_epoch();
        let interval = self.config.flush_interval();
        let inner = Arc::clone(self);

        let task = self.runtime.spawn(async move {
            tokio::time::sleep(interval).await;
            inner.flush_on_timer(epoch).await;
        });
        state.arm(epoch, task);
        debug!("Flush timer armed for {}ms", interval.as_millis());
    }

    async fn flush_on_timer(self: Arc<Self>, epoch: u64) {
        let entries = {
            let mut state = self.state.lock();
            // A size or manual flush got here first.
            if !state.is_current_timer(epoch) {
                return;
            }
            state.take(false)
        };

        if !entries.is_empty() {
            self.dispatch(entries, FlushTrigger::Timer).await;
        }
    }

    /// Send one snapshot and resolve every waiter in it
    async fn dispatch(&self, mut entries: Vec<BufferedRequest>, trigger: FlushTrigger) -> FlushReport {
        let _flight = self.flight.lock().await;

        let mut report = FlushReport::empty(trigger);
        report.items = entries.len();

        let request = self.build_batch_request(&entries);
        metrics::record_batch(trigger.as_str(), entries.len());
        self.stats.record_batch();
        let oldest = entries
            .iter()
            .map(BufferedRequest::age)
            .max()
            .unwrap_or_default();
        info!(
            "Dispatching batch of {} items ({} trigger, oldest waited {}ms)",
            entries.len(),
            trigger.as_str(),
            oldest.as_millis()
        );

        let start = Instant::now();
        let result = self.backend.classify_batch(&request).await;
        metrics::record_dispatch_latency("batch", start.elapsed().as_micros() as u64);

        match result {
            Ok(response) => {
                let summary = demux(&mut entries, &response, &self.config, &self.stats);
                report.path = DispatchPath::Batch;
                report.waiters = summary.delivered;
                report.implicit_clean = summary.implicit_clean;
            }
            Err(err) if err.is_retryable_as_items() => {
                warn!(
                    "Batch call failed ({}), retrying {} items individually",
                    err,
                    entries.len()
                );
                metrics::record_fallback(err.kind());
                self.stats.record_fallback();

                let summary = retry_individually(
                    self.backend.as_ref(),
                    &mut entries,
                    &self.config,
                    &self.stats,
                )
                .await;
                report.path = DispatchPath::Fallback;
                report.waiters = summary.delivered;
                report.failed = summary.failed;
            }
            Err(err) => {
                warn!("Batch call rejected ({}), surfacing to all callers", err);
                let mut delivered = 0;
                for entry in entries.iter_mut() {
                    delivered += entry.resolve_all(Err(err.clone()));
                    metrics::record_item_failure(err.kind());
                }
                self.stats.record_errors(delivered as u64);
                report.path = DispatchPath::Rejected;
                report.waiters = delivered;
                report.failed = entries.len();
            }
        }

        debug!("Flush complete: {:?}", report);
        report
    }

    fn build_batch_request(&self, entries: &[BufferedRequest]) -> BatchClassifyRequest {
        let items = entries
            .iter()
            .map(|entry| {
                let item = WireItem::from_request(entry.request());
                if self.config.match_by_key {
                    item.with_client_key(entry.key())
                } else {
                    item
                }
            })
            .collect();

        BatchClassifyRequest {
            items,
            store_clean: self.config.store_clean,
            persist: self.config.persist,
        }
    }
}
