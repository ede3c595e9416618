//! Batcher configuration

use commentguard_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for batching behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatcherConfig {
    /// Distinct buffered items that trigger an immediate flush
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum time the first request of a window waits before a flush
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Ask the backend to store clean verdicts too
    #[serde(default)]
    pub store_clean: bool,

    /// Ask the backend to persist classified comments
    #[serde(default = "default_true")]
    pub persist: bool,

    /// Confidence given to items the backend left out of a batch response
    #[serde(default = "default_implicit_clean_confidence")]
    pub implicit_clean_confidence: f32,

    /// Send dedup keys with batch items and match responses that echo them
    /// by key before falling back to text equality
    #[serde(default)]
    pub match_by_key: bool,
}

impl BatcherConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_key_matching(mut self, enabled: bool) -> Self {
        self.match_by_key = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::config("batch_size must be greater than zero"));
        }
        if self.flush_interval_ms == 0 {
            return Err(Error::config("flush_interval_ms must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.implicit_clean_confidence) {
            return Err(Error::config(format!(
                "implicit_clean_confidence must be within [0, 1], got {}",
                self.implicit_clean_confidence
            )));
        }
        Ok(())
    }
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            flush_interval_ms: default_flush_interval_ms(),
            store_clean: false,
            persist: true,
            implicit_clean_confidence: default_implicit_clean_confidence(),
            match_by_key: false,
        }
    }
}

fn default_batch_size() -> usize {
    100
}

fn default_flush_interval_ms() -> u64 {
    2_000
}

fn default_implicit_clean_confidence() -> f32 {
    0.5
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BatcherConfig::default();
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.flush_interval(), Duration::from_millis(2000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: BatcherConfig = serde_json::from_str(r#"{"batch_size": 10}"#).unwrap();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.flush_interval_ms, 2_000);
        assert!(config.persist);
    }

    #[test]
    fn test_validate_rejects_zero_size() {
        assert!(BatcherConfig::default().with_batch_size(0).validate().is_err());
        assert!(BatcherConfig::default()
            .with_flush_interval(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn test_huge_interval_saturates() {
        let config = BatcherConfig::default().with_flush_interval(Duration::MAX);
        assert_eq!(config.flush_interval_ms, u64::MAX);
        assert!(config.validate().is_ok());
    }
}
