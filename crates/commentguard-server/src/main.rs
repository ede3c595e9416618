//! CommentGuard Server
//!
//! Local service that content scripts submit comments to. Submissions are
//! coalesced into batches before reaching the classification API.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{info, warn};

mod config;
mod routes;
mod state;

use config::ServerConfig;
use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "commentguard-server")]
#[command(about = "CommentGuard batching classification service", long_about = None)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "commentguard.yaml")]
    config: String,

    /// Classification API base URL
    #[arg(short, long)]
    backend: Option<String>,

    /// Bearer token for the classification API
    #[arg(long, env = "COMMENTGUARD_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// Distinct items that trigger an immediate flush
    #[arg(long)]
    batch_size: Option<usize>,

    /// Maximum wait before a partial batch is flushed
    #[arg(long)]
    flush_interval_ms: Option<u64>,

    /// Classify every submission with its own call
    #[arg(long)]
    no_batching: bool,

    /// Listen address
    #[arg(short = 'l', long, default_value = "127.0.0.1")]
    listen: String,

    /// Listen port
    #[arg(short = 'P', long, default_value = "8787")]
    port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    info!("Starting CommentGuard Server");

    let config = ServerConfig::load(&cli.config, &cli)?;
    info!(
        "Configuration loaded: batch_size={}, flush_interval={}ms, batching_disabled={}",
        config.batcher.batch_size, config.batcher.flush_interval_ms, config.batching_disabled
    );

    let metrics_handle = init_metrics()?;
    let state = AppState::new(config, Some(metrics_handle))?;
    let batcher = state.batcher.clone();

    let addr: SocketAddr = format!("{}:{}", cli.listen, cli.port).parse()?;
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Nothing buffered may be left unresolved.
    let report = batcher.flush_now().await;
    info!(
        "Drained {} pending items on shutdown ({:?})",
        report.items, report.path
    );

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Shutdown signal received, stopping server...");
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("commentguard=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("commentguard=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    commentguard_telemetry::metrics::describe();

    info!("Metrics exporter initialized");
    Ok(handle)
}
