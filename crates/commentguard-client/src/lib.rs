//! CommentGuard Client
//!
//! The boundary between the batching engine and the remote classification
//! service:
//! - Wire types for `POST /batch-classify` and `POST /classify`
//! - The [`ClassificationBackend`] trait the engine dispatches through
//! - A reqwest-backed [`HttpBackend`] with status-to-error mapping
//! - The credential collaborator seam

pub mod backend;
pub mod config;
pub mod credentials;
pub mod http;
pub mod wire;

pub use backend::ClassificationBackend;
pub use config::ClientConfig;
pub use credentials::{Credential, CredentialProvider, StaticCredentials};
pub use http::HttpBackend;
pub use wire::{BatchClassifyRequest, BatchClassifyResponse, ClassifyRequest, WireItem, WireResult};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::backend::ClassificationBackend;
    pub use crate::http::HttpBackend;
    pub use crate::wire::{BatchClassifyRequest, BatchClassifyResponse, ClassifyRequest, WireItem};
}
