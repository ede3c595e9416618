//! Shared application state

use anyhow::Result;
use commentguard_batcher::Batcher;
use commentguard_client::{ClassificationBackend, HttpBackend, StaticCredentials};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ServerConfig;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,

    /// Batching engine in front of the classification API
    pub batcher: Batcher,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    /// Build the HTTP backend and batcher from configuration
    pub fn new(config: ServerConfig, metrics_handle: Option<PrometheusHandle>) -> Result<Self> {
        let credential = config.auth.credential();
        if credential.is_none() {
            warn!("No backend credential configured; calls will be unauthenticated");
        }

        let backend = HttpBackend::new(
            config.backend.clone(),
            Arc::new(StaticCredentials::new(credential)),
        )?;
        info!("Backend: {}", backend.config().base_url);

        Self::with_backend(config, Arc::new(backend), metrics_handle)
    }

    /// Build state around any backend
    pub fn with_backend(
        config: ServerConfig,
        backend: Arc<dyn ClassificationBackend>,
        metrics_handle: Option<PrometheusHandle>,
    ) -> Result<Self> {
        let batcher = Batcher::new(config.batcher.clone(), backend)?;
        if config.batching_disabled {
            info!("Batching disabled; submissions use the single-item path");
        }

        Ok(Self {
            config: Arc::new(config),
            batcher,
            metrics_handle,
        })
    }
}
