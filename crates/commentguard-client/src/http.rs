//! reqwest-backed classification backend

use async_trait::async_trait;
use commentguard_core::{ClassificationOutcome, Error, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::backend::ClassificationBackend;
use crate::config::ClientConfig;
use crate::credentials::{Credential, CredentialProvider};
use crate::wire::{BatchClassifyRequest, BatchClassifyResponse, ClassifyRequest, WireResult};

const BATCH_PATH: &str = "/batch-classify";
const SINGLE_PATH: &str = "/classify";

/// Longest backend body echoed into an error message
const MAX_DETAIL_LEN: usize = 512;

/// HTTP client for the classification API
pub struct HttpBackend {
    config: ClientConfig,
    client: reqwest::Client,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpBackend {
    /// Create a backend with the configured per-call deadline
    pub fn new(config: ClientConfig, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::config(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            config,
            client,
            credentials,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Send,
    {
        let url = self.config.endpoint(path);
        let start = Instant::now();

        let mut request = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body);

        request = match self.credentials.credential() {
            Some(Credential::Bearer(token)) => request.bearer_auth(token),
            Some(Credential::Basic { username, password }) => {
                request.basic_auth(username, Some(password))
            }
            None => request,
        };

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        debug!(
            "POST {} -> {} in {}us",
            url,
            status,
            start.elapsed().as_micros()
        );

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, &body));
        }

        let bytes = response.bytes().await.map_err(map_transport_error)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            warn!("Malformed response from {}: {}", url, e);
            Error::dispatch(format!("malformed response: {}", e))
        })
    }
}

#[async_trait]
impl ClassificationBackend for HttpBackend {
    async fn classify_batch(&self, request: &BatchClassifyRequest) -> Result<BatchClassifyResponse> {
        self.post(BATCH_PATH, request).await
    }

    async fn classify(&self, request: &ClassifyRequest) -> Result<ClassificationOutcome> {
        let result: WireResult = self.post(SINGLE_PATH, request).await?;
        Ok(result.to_outcome())
    }

    fn name(&self) -> &str {
        "http"
    }
}

fn map_transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout
    } else {
        Error::dispatch(err.to_string())
    }
}

/// Map a non-2xx status onto the error taxonomy
pub fn map_status(status: StatusCode, body: &str) -> Error {
    match status {
        StatusCode::UNAUTHORIZED => Error::auth(truncate(body)),
        StatusCode::UNPROCESSABLE_ENTITY => Error::validation(validation_detail(body)),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => Error::Timeout,
        other => Error::dispatch(format!("backend returned {}: {}", other, truncate(body))),
    }
}

/// Pull the message and field errors out of a 422 body when it is JSON
fn validation_detail(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return truncate(body);
    };

    let message = value
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("unprocessable entity");

    match value.get("errors") {
        Some(errors) => truncate(&format!("{}: {}", message, errors)),
        None => message.to_string(),
    }
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_DETAIL_LEN {
        return body.to_string();
    }
    let mut end = MAX_DETAIL_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
