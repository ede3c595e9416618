//! Classification backend trait

use async_trait::async_trait;
use commentguard_core::{ClassificationOutcome, Result};

use crate::wire::{BatchClassifyRequest, BatchClassifyResponse, ClassifyRequest};

/// Trait for the remote service the engine dispatches to
#[async_trait]
pub trait ClassificationBackend: Send + Sync {
    /// Classify many items in one round-trip
    async fn classify_batch(&self, request: &BatchClassifyRequest) -> Result<BatchClassifyResponse>;

    /// Classify a single item
    async fn classify(&self, request: &ClassifyRequest) -> Result<ClassificationOutcome>;

    /// Get the backend name
    fn name(&self) -> &str;
}
