//! HTTP routes and handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use commentguard_batcher::FlushReport;
use commentguard_core::{ClassificationOutcome, CommentRequest, Error};
use commentguard_telemetry::ScanStats;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/v1/submit", post(submit))
        .route("/v1/flush", post(flush))
        .route("/v1/stats", get(stats))
        .route("/v1/stats/reset", post(reset_stats))
        .route("/v1/stats/delta", get(stats_delta))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics_handle {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics exporter not installed").into_response(),
    }
}

#[derive(Debug, Serialize)]
struct SubmitResponse {
    key: String,
    #[serde(flatten)]
    outcome: ClassificationOutcome,
}

/// Classify one comment, waiting for the batch it lands in
async fn submit(
    State(state): State<AppState>,
    Json(request): Json<CommentRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    let key = request.dedup_key();

    let outcome = if state.config.batching_disabled {
        state.batcher.classify_unbatched(request).await?
    } else {
        let handle = state.batcher.submit(request)?;
        debug!(key = handle.key(), "Submission queued");
        handle.await?
    };

    Ok(Json(SubmitResponse { key, outcome }))
}

async fn flush(State(state): State<AppState>) -> Json<FlushReport> {
    let report = state.batcher.flush_now().await;
    info!("Manual flush: {} items via {:?}", report.items, report.path);
    Json(report)
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    #[serde(flatten)]
    stats: ScanStats,
    toxic: u64,
    toxic_rate: f64,
    pending: usize,
}

async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.batcher.stats();
    Json(StatsResponse {
        toxic: stats.toxic(),
        toxic_rate: stats.toxic_rate(),
        pending: state.batcher.pending_len(),
        stats,
    })
}

async fn reset_stats(State(state): State<AppState>) -> StatusCode {
    state.batcher.reset_stats();
    info!("Stats reset");
    StatusCode::NO_CONTENT
}

async fn stats_delta(State(state): State<AppState>) -> Json<ScanStats> {
    Json(state.batcher.take_stats_delta())
}

/// Engine error rendered as an HTTP response
struct AppError(Error);

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::AuthFailure(_) => StatusCode::UNAUTHORIZED,
            Error::ValidationFailure { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Error::Closed | Error::Internal(_) | Error::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Error::Dispatch(_) | Error::Serialization(_) => StatusCode::BAD_GATEWAY,
        };

        let body = json!({
            "error": {
                "message": self.0.to_string(),
                "type": self.0.kind(),
            }
        });

        (status, Json(body)).into_response()
    }
}
