//! Mock classification backend for testing
//!
//! Mirrors the real service closely enough to exercise the batcher: batch
//! responses only carry items with a configured verdict, and single-item
//! calls can be made to fail for specific texts.

#![allow(dead_code)]

use async_trait::async_trait;
use commentguard_client::{
    BatchClassifyRequest, BatchClassifyResponse, ClassificationBackend, ClassifyRequest, WireResult,
};
use commentguard_core::{Category, ClassificationOutcome, Error, Result};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Confidence returned by single-item calls for texts without a verdict
pub const DEFAULT_SINGLE_CONFIDENCE: f32 = 0.99;

/// A configurable mock backend
#[derive(Default)]
pub struct MockBackend {
    verdicts: HashMap<String, (i32, f32)>,
    batch_error: Mutex<Option<Error>>,
    failing_items: HashSet<String>,
    batch_latency: Option<Duration>,
    batch_calls: AtomicUsize,
    single_calls: AtomicUsize,
    batches: Mutex<Vec<BatchClassifyRequest>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return this verdict whenever `text` is classified
    pub fn with_verdict(mut self, text: &str, prediction: i32, confidence: f32) -> Self {
        self.verdicts.insert(text.to_string(), (prediction, confidence));
        self
    }

    /// Make every batch call fail with `err`
    pub fn failing_batch(self, err: Error) -> Self {
        *self.batch_error.lock() = Some(err);
        self
    }

    /// Make single-item calls for `text` fail
    pub fn failing_item(mut self, text: &str) -> Self {
        self.failing_items.insert(text.to_string());
        self
    }

    /// Delay every batch call
    pub fn with_batch_latency(mut self, latency: Duration) -> Self {
        self.batch_latency = Some(latency);
        self
    }

    /// Switch batch failures on or off at runtime
    pub fn set_batch_error(&self, err: Option<Error>) {
        *self.batch_error.lock() = err;
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn single_calls(&self) -> usize {
        self.single_calls.load(Ordering::SeqCst)
    }

    /// Every batch request received, in order
    pub fn batches(&self) -> Vec<BatchClassifyRequest> {
        self.batches.lock().clone()
    }
}

#[async_trait]
impl ClassificationBackend for MockBackend {
    async fn classify_batch(&self, request: &BatchClassifyRequest) -> Result<BatchClassifyResponse> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.batches.lock().push(request.clone());

        if let Some(latency) = self.batch_latency {
            tokio::time::sleep(latency).await;
        }

        let failure = self.batch_error.lock().clone();
        if let Some(err) = failure {
            return Err(err);
        }

        let results: Vec<WireResult> = request
            .items
            .iter()
            .filter_map(|item| {
                let (prediction, confidence) = *self.verdicts.get(&item.text)?;
                Some(WireResult {
                    text: item.text.clone(),
                    prediction,
                    confidence,
                    client_key: item.client_key.clone(),
                    keywords: Vec::new(),
                    probabilities: None,
                    extra: serde_json::Map::new(),
                })
            })
            .collect();

        Ok(BatchClassifyResponse {
            count: results.len(),
            results,
        })
    }

    async fn classify(&self, request: &ClassifyRequest) -> Result<ClassificationOutcome> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing_items.contains(&request.item.text) {
            return Err(Error::dispatch(format!(
                "backend returned 500 for {:?}",
                request.item.text
            )));
        }

        Ok(match self.verdicts.get(&request.item.text) {
            Some(&(prediction, confidence)) => {
                ClassificationOutcome::new(Category::from_code(prediction), confidence)
            }
            None => ClassificationOutcome::new(Category::Clean, DEFAULT_SINGLE_CONFIDENCE),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
