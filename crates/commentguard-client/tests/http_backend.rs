//! HttpBackend against a local stub of the classification API

use axum::{
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use commentguard_client::{
    BatchClassifyRequest, ClassificationBackend, ClassifyRequest, ClientConfig, Credential,
    HttpBackend, StaticCredentials, WireItem,
};
use commentguard_core::{Category, CommentRequest, Error};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const TOKEN: &str = "test-token";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

async fn batch_classify(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthenticated." })));
    }
    let Some(items) = body["items"].as_array() else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "The given data was invalid.", "errors": { "items": ["required"] } })),
        );
    };

    // Only toxic items come back, like the real service.
    let results: Vec<Value> = items
        .iter()
        .filter(|item| item["text"].as_str().unwrap_or_default().contains("idiot"))
        .map(|item| json!({ "text": item["text"], "prediction": 1, "confidence": 0.91 }))
        .collect();

    (StatusCode::OK, Json(json!({ "count": results.len(), "results": results })))
}

async fn classify(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthenticated." })));
    }
    if body["text"] == "explode" {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "message": "Server Error" })));
    }
    if body["text"] == "slow" {
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
    (
        StatusCode::OK,
        Json(json!({ "text": body["text"], "prediction": 0, "confidence": 0.97 })),
    )
}

async fn start_stub() -> String {
    let app = Router::new()
        .route("/api/batch-classify", post(batch_classify))
        .route("/api/classify", post(classify));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/api", addr)
}

fn backend(base_url: &str, token: Option<&str>) -> HttpBackend {
    let credentials = match token {
        Some(token) => StaticCredentials::bearer(token),
        None => StaticCredentials::none(),
    };
    HttpBackend::new(ClientConfig::new(base_url), Arc::new(credentials)).unwrap()
}

fn single(text: &str) -> ClassifyRequest {
    ClassifyRequest {
        item: WireItem::from_request(&CommentRequest::new(text, "web")),
        store_clean: false,
        persist: false,
    }
}

#[tokio::test]
async fn test_batch_round_trip() {
    let base = start_stub().await;
    let backend = backend(&base, Some(TOKEN));

    let request = BatchClassifyRequest {
        items: vec![
            WireItem::from_request(&CommentRequest::new("what an idiot", "youtube")),
            WireItem::from_request(&CommentRequest::new("lovely", "youtube")),
        ],
        store_clean: false,
        persist: true,
    };

    let response = backend.classify_batch(&request).await.unwrap();
    assert_eq!(response.count, 1);
    assert_eq!(response.results[0].text, "what an idiot");
    assert_eq!(response.results[0].to_outcome().category, Category::Offensive);
}

#[tokio::test]
async fn test_single_round_trip() {
    let base = start_stub().await;
    let outcome = backend(&base, Some(TOKEN))
        .classify(&single("have a nice day"))
        .await
        .unwrap();

    assert_eq!(outcome.category, Category::Clean);
    assert!((outcome.confidence - 0.97).abs() < 1e-6);
}

#[tokio::test]
async fn test_missing_credential_is_auth_failure() {
    let base = start_stub().await;
    let err = backend(&base, None)
        .classify(&single("hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::AuthFailure(_)));
}

#[tokio::test]
async fn test_refreshed_credential_applies_to_next_call() {
    let base = start_stub().await;
    let credentials = Arc::new(StaticCredentials::bearer("stale-token"));
    let backend = HttpBackend::new(ClientConfig::new(&base), credentials.clone()).unwrap();

    let err = backend.classify(&single("hello")).await.unwrap_err();
    assert!(matches!(err, Error::AuthFailure(_)));

    credentials.set(Some(Credential::Bearer(TOKEN.to_string())));
    let outcome = backend.classify(&single("hello")).await.unwrap();
    assert_eq!(outcome.category, Category::Clean);
}

#[tokio::test]
async fn test_server_error_is_dispatch_failure() {
    let base = start_stub().await;
    let err = backend(&base, Some(TOKEN))
        .classify(&single("explode"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Dispatch(_)));
}

#[tokio::test]
async fn test_deadline_is_enforced() {
    let base = start_stub().await;
    let mut config = ClientConfig::new(&base);
    config.request_timeout_ms = 100;
    let backend = HttpBackend::new(config, Arc::new(StaticCredentials::bearer(TOKEN))).unwrap();

    let err = backend.classify(&single("slow")).await.unwrap_err();
    assert_eq!(err, Error::Timeout);
}

#[tokio::test]
async fn test_unreachable_backend_is_dispatch_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = backend(&format!("http://{}/api", addr), Some(TOKEN))
        .classify(&single("hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Dispatch(_)));
}
