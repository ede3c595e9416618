//! CommentGuard Core
//!
//! Core types and utilities shared across CommentGuard components.
//!
//! This crate provides:
//! - The error taxonomy surfaced to callers of the classification engine
//! - Classification outcomes and the category codes the backend reports
//! - The comment request submitted by content scripts
//! - Dedup key derivation for collapsing duplicate in-flight requests

pub mod error;
pub mod keyer;
pub mod types;

pub use error::{Error, Result};
pub use keyer::{dedup_key, text_fingerprint};
pub use types::{Category, ClassificationOutcome, CommentRequest, OutcomeDetail};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::keyer::dedup_key;
    pub use crate::types::{Category, ClassificationOutcome, CommentRequest};
}
