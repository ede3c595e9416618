//! JSON bodies exchanged with the classification API

use commentguard_core::{Category, ClassificationOutcome, CommentRequest, OutcomeDetail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One item of an outbound classification call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireItem {
    pub text: String,
    pub platform: String,
    pub platform_id: Option<String>,
    pub source_url: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    /// Client-assigned dedup key, only sent when key-based matching is on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
}

impl WireItem {
    /// Build a wire item from a caller request
    pub fn from_request(request: &CommentRequest) -> Self {
        Self {
            text: request.text.clone(),
            platform: request.platform.clone(),
            platform_id: request.platform_id.clone(),
            source_url: request.source_url.clone(),
            metadata: request.metadata.clone(),
            client_key: None,
        }
    }

    /// Echo the dedup key so the backend can return it
    pub fn with_client_key(mut self, key: impl Into<String>) -> Self {
        self.client_key = Some(key.into());
        self
    }
}

/// Body of `POST /batch-classify`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchClassifyRequest {
    pub items: Vec<WireItem>,
    pub store_clean: bool,
    pub persist: bool,
}

/// Body of `POST /classify`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyRequest {
    #[serde(flatten)]
    pub item: WireItem,
    pub store_clean: bool,
    pub persist: bool,
}

/// Per-item classification returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireResult {
    #[serde(default)]
    pub text: String,
    pub prediction: i32,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<BTreeMap<String, f32>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl WireResult {
    /// Convert into the caller-facing outcome
    pub fn to_outcome(&self) -> ClassificationOutcome {
        ClassificationOutcome::new(Category::from_code(self.prediction), self.confidence)
            .with_detail(OutcomeDetail {
                keywords: self.keywords.clone(),
                probabilities: self.probabilities.clone(),
                extra: self.extra.clone(),
            })
    }
}

/// Body returned by `POST /batch-classify`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchClassifyResponse {
    #[serde(default)]
    pub count: usize,
    pub results: Vec<WireResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_batch_request_shape() {
        let request = CommentRequest::new("hello", "web")
            .with_source_url("https://example.com/post")
            .with_metadata("client", "ext-1");
        let body = BatchClassifyRequest {
            items: vec![WireItem::from_request(&request)],
            store_clean: false,
            persist: true,
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "items": [{
                    "text": "hello",
                    "platform": "web",
                    "platform_id": null,
                    "source_url": "https://example.com/post",
                    "metadata": { "client": "ext-1" }
                }],
                "store_clean": false,
                "persist": true
            })
        );
    }

    #[test]
    fn test_single_request_is_flat() {
        let body = ClassifyRequest {
            item: WireItem::from_request(&CommentRequest::new("hi", "twitter")),
            store_clean: true,
            persist: false,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["text"], "hi");
        assert_eq!(value["platform"], "twitter");
        assert_eq!(value["store_clean"], true);
    }

    #[test]
    fn test_response_parsing_keeps_detail() {
        let response: BatchClassifyResponse = serde_json::from_value(json!({
            "count": 1,
            "results": [{
                "text": "buy now!!!",
                "prediction": 3,
                "confidence": 0.8,
                "keywords": ["buy"],
                "label": "spam"
            }]
        }))
        .unwrap();

        let outcome = response.results[0].to_outcome();
        assert_eq!(outcome.category, Category::Spam);
        assert!((outcome.confidence - 0.8).abs() < f32::EPSILON);
        assert_eq!(outcome.detail.keywords, vec!["buy".to_string()]);
        assert_eq!(outcome.detail.extra["label"], "spam");
        assert!(!outcome.implicit);
    }

    #[test]
    fn test_response_without_count() {
        let response: BatchClassifyResponse =
            serde_json::from_value(json!({ "results": [] })).unwrap();
        assert_eq!(response.count, 0);
        assert!(response.results.is_empty());
    }
}
