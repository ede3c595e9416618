//! Pending request table

use commentguard_core::{ClassificationOutcome, CommentRequest, Result};
use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::handle::Waiter;

/// One buffered request plus every caller waiting on its result
#[derive(Debug)]
pub struct BufferedRequest {
    key: String,
    request: CommentRequest,
    waiters: Vec<Waiter>,
    enqueued_at: Instant,
}

impl BufferedRequest {
    pub fn new(key: impl Into<String>, request: CommentRequest, waiter: Waiter) -> Self {
        Self {
            key: key.into(),
            request,
            waiters: vec![waiter],
            enqueued_at: Instant::now(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn request(&self) -> &CommentRequest {
        &self.request
    }

    pub fn text(&self) -> &str {
        &self.request.text
    }

    pub fn waiter_count(&self) -> usize {
        self.waiters.len()
    }

    /// Time since the first submission for this key
    pub fn age(&self) -> Duration {
        self.enqueued_at.elapsed()
    }

    pub(crate) fn add_waiter(&mut self, waiter: Waiter) {
        self.waiters.push(waiter);
    }

    /// Deliver the same result to every waiter.
    ///
    /// Returns how many waiters were resolved by this call; already-resolved
    /// waiters are skipped.
    pub fn resolve_all(&mut self, result: Result<ClassificationOutcome>) -> usize {
        let mut delivered = 0;
        for waiter in &mut self.waiters {
            if waiter.resolve(result.clone()) {
                delivered += 1;
            }
        }
        delivered
    }
}

/// Outcome of inserting into the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Insertion {
    /// A new entry was created
    New,
    /// The key was already buffered; a waiter was appended
    Duplicate,
}

/// The armed deferred-flush timer
#[derive(Debug)]
pub(crate) struct ArmedTimer {
    pub epoch: u64,
    pub task: JoinHandle<()>,
}

/// Ordered map from dedup key to buffered request, plus the flush timer.
///
/// Lives behind the batcher's state lock; every method is a step of a
/// compound operation that must not interleave with another submitter.
#[derive(Debug, Default)]
pub(crate) struct PendingBuffer {
    entries: Vec<BufferedRequest>,
    index: HashMap<String, usize>,
    timer: Option<ArmedTimer>,
    epoch: u64,
}

impl PendingBuffer {
    pub fn insert(&mut self, key: String, request: CommentRequest, waiter: Waiter) -> Insertion {
        if let Some(&slot) = self.index.get(&key) {
            self.entries[slot].add_waiter(waiter);
            return Insertion::Duplicate;
        }

        self.index.insert(key.clone(), self.entries.len());
        self.entries.push(BufferedRequest::new(key, request, waiter));
        Insertion::New
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn timer_armed(&self) -> bool {
        self.timer.is_some()
    }

    /// Epoch the next armed timer must carry
    pub fn next_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    pub fn arm(&mut self, epoch: u64, task: JoinHandle<()>) {
        debug_assert!(self.timer.is_none(), "flush timer armed twice");
        self.timer = Some(ArmedTimer { epoch, task });
    }

    /// Whether the timer carrying `epoch` is still the armed one
    pub fn is_current_timer(&self, epoch: u64) -> bool {
        self.timer.as_ref().map(|t| t.epoch) == Some(epoch)
    }

    /// Drain every entry and disarm the timer.
    ///
    /// `abort_timer` is false when the timer task itself is draining, since
    /// aborting it would cancel the dispatch it is about to run.
    pub fn take(&mut self, abort_timer: bool) -> Vec<BufferedRequest> {
        if let Some(timer) = self.timer.take() {
            if abort_timer {
                timer.task.abort();
            }
        }
        self.epoch += 1;
        self.index.clear();
        std::mem::take(&mut self.entries)
    }
}
