//! Client configuration

use commentguard_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for [`crate::HttpBackend`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the classification API, e.g. `https://api.example.com/api`
    pub base_url: String,

    /// Deadline applied to every backend call
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Full URL for an API path such as `/classify`
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::config(format!(
                "backend url must be http(s): {}",
                self.base_url
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(Error::config("request_timeout_ms must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://127.0.0.1:8000/api")
    }
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_slashes() {
        let config = ClientConfig::new("https://api.example.com/api/");
        assert_eq!(
            config.endpoint("/batch-classify"),
            "https://api.example.com/api/batch-classify"
        );
    }

    #[test]
    fn test_validate() {
        assert!(ClientConfig::default().validate().is_ok());
        assert!(ClientConfig::new("ftp://nope").validate().is_err());

        let mut config = ClientConfig::default();
        config.request_timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}
