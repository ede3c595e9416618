//! Backend credentials
//!
//! Credential storage and refresh live outside the engine; it only asks a
//! [`CredentialProvider`] for the current value on every call.

use parking_lot::RwLock;

/// A credential attached to outbound calls
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Bearer(String),
    Basic { username: String, password: String },
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer(***)"),
            Self::Basic { username, .. } => write!(f, "Basic({}:***)", username),
        }
    }
}

/// Supplies the credential for the next backend call
pub trait CredentialProvider: Send + Sync {
    fn credential(&self) -> Option<Credential>;
}

/// Provider holding a fixed credential that can be swapped at runtime
#[derive(Debug, Default)]
pub struct StaticCredentials {
    inner: RwLock<Option<Credential>>,
}

impl StaticCredentials {
    pub fn new(credential: Option<Credential>) -> Self {
        Self {
            inner: RwLock::new(credential),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self::new(Some(Credential::Bearer(token.into())))
    }

    pub fn none() -> Self {
        Self::new(None)
    }

    /// Replace the credential, e.g. after an external refresh
    pub fn set(&self, credential: Option<Credential>) {
        *self.inner.write() = credential;
    }
}

impl CredentialProvider for StaticCredentials {
    fn credential(&self) -> Option<Credential> {
        self.inner.read().clone()
    }
}
