//! Error types for CommentGuard

/// Result type alias using CommentGuard's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for CommentGuard operations.
///
/// Errors are `Clone` because a single failure is delivered to every waiter
/// collapsed onto the same dedup key.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Text was empty or whitespace-only; rejected before buffering
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Credential rejected by the backend (HTTP 401)
    #[error("authentication failed: {0}")]
    AuthFailure(String),

    /// Backend rejected the payload as malformed (HTTP 422)
    #[error("validation failed: {detail}")]
    ValidationFailure {
        /// Diagnostic detail returned by the backend
        detail: String,
    },

    /// Network error, non-2xx status or malformed response on a dispatch
    #[error("dispatch failed: {0}")]
    Dispatch(String),

    /// Backend call exceeded its deadline
    #[error("operation timed out")]
    Timeout,

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The result handle was dropped before it could be resolved
    #[error("result channel closed before resolution")]
    Closed,

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::AuthFailure(msg.into())
    }

    /// Create a new validation error carrying backend detail
    pub fn validation(detail: impl Into<String>) -> Self {
        Self::ValidationFailure {
            detail: detail.into(),
        }
    }

    /// Create a new dispatch error
    pub fn dispatch(msg: impl Into<String>) -> Self {
        Self::Dispatch(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether a failed batch call should be retried item by item.
    ///
    /// Credential failures are surfaced unchanged; everything else gets
    /// per-item isolation since one bad item must not taint the rest.
    pub fn is_retryable_as_items(&self) -> bool {
        !matches!(
            self,
            Self::AuthFailure(_) | Self::InvalidInput(_) | Self::Config(_) | Self::Closed
        )
    }

    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::AuthFailure(_) => "auth",
            Self::ValidationFailure { .. } => "validation",
            Self::Dispatch(_) => "dispatch",
            Self::Timeout => "timeout",
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
            Self::Closed => "closed",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
