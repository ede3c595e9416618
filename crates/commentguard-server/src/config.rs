//! Server configuration

use commentguard_batcher::BatcherConfig;
use commentguard_client::{ClientConfig, Credential};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Classification API connection
    #[serde(default)]
    pub backend: ClientConfig,

    /// Batching behavior
    #[serde(default)]
    pub batcher: BatcherConfig,

    /// Send every submission straight through the single-item path
    #[serde(default)]
    pub batching_disabled: bool,

    /// Backend credentials
    #[serde(default)]
    pub auth: AuthConfig,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &crate::Cli) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config: Self = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        // Apply CLI overrides
        if let Some(backend) = &cli.backend {
            config.backend.base_url = backend.clone();
        }
        if let Some(token) = &cli.api_token {
            config.auth.token = Some(token.clone());
        }
        if let Some(batch_size) = cli.batch_size {
            config.batcher.batch_size = batch_size;
        }
        if let Some(interval) = cli.flush_interval_ms {
            config.batcher.flush_interval_ms = interval;
        }
        if cli.no_batching {
            config.batching_disabled = true;
        }

        config.backend.validate()?;
        config.batcher.validate()?;
        Ok(config)
    }
}

/// Backend credentials; a bearer token wins over basic credentials
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl AuthConfig {
    pub fn credential(&self) -> Option<Credential> {
        if let Some(token) = &self.token {
            return Some(Credential::Bearer(token.clone()));
        }
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(Credential::Basic {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}
