//! Core types for CommentGuard

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::keyer::dedup_key;

/// Discrete classification category reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Clean,
    Offensive,
    Hate,
    Spam,
    /// Application-defined code outside the built-in set
    Other(i32),
}

impl Category {
    /// Map a backend `prediction` code to a category
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Clean,
            1 => Self::Offensive,
            2 => Self::Hate,
            3 => Self::Spam,
            other => Self::Other(other),
        }
    }

    /// Backend `prediction` code for this category
    pub fn code(&self) -> i32 {
        match self {
            Self::Clean => 0,
            Self::Offensive => 1,
            Self::Hate => 2,
            Self::Spam => 3,
            Self::Other(code) => *code,
        }
    }

    /// Whether this category should be flagged to the user
    pub fn is_toxic(&self) -> bool {
        matches!(self, Self::Offensive | Self::Hate | Self::Spam)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => f.write_str("clean"),
            Self::Offensive => f.write_str("offensive"),
            Self::Hate => f.write_str("hate"),
            Self::Spam => f.write_str("spam"),
            Self::Other(code) => write!(f, "other({})", code),
        }
    }
}

/// Optional supporting detail attached to an outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeDetail {
    /// Keywords the backend flagged
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    /// Per-class probability distribution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<BTreeMap<String, f32>>,

    /// Remaining fields the backend returned
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Result of classifying one text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationOutcome {
    /// Discrete category
    pub category: Category,

    /// Confidence score (0.0-1.0)
    pub confidence: f32,

    /// Supporting detail
    #[serde(default)]
    pub detail: OutcomeDetail,

    /// True when the backend omitted the item from a batch response and the
    /// outcome was filled in as clean
    #[serde(default)]
    pub implicit: bool,
}

impl ClassificationOutcome {
    /// Create a new outcome, clamping confidence into [0, 1]
    pub fn new(category: Category, confidence: f32) -> Self {
        Self {
            category,
            confidence: clamp_confidence(confidence),
            detail: OutcomeDetail::default(),
            implicit: false,
        }
    }

    /// Clean outcome for an item the backend left out of a batch response
    pub fn implicit_clean(confidence: f32) -> Self {
        Self {
            implicit: true,
            ..Self::new(Category::Clean, confidence)
        }
    }

    /// Attach supporting detail
    pub fn with_detail(mut self, detail: OutcomeDetail) -> Self {
        self.detail = detail;
        self
    }
}

fn clamp_confidence(confidence: f32) -> f32 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

/// A caller's request to classify one comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRequest {
    /// Content to classify
    pub text: String,

    /// Source platform tag (facebook, youtube, twitter, web, ...)
    pub platform: String,

    /// Platform-native identifier of the comment
    #[serde(default)]
    pub platform_id: Option<String>,

    /// Page URL where the comment was observed
    #[serde(default)]
    pub source_url: Option<String>,

    /// Free-form provenance (client identity, submission timestamp)
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl CommentRequest {
    /// Create a request with no platform id, URL or metadata
    pub fn new(text: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            platform: platform.into(),
            platform_id: None,
            source_url: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Set the platform-native id
    pub fn with_platform_id(mut self, id: impl Into<String>) -> Self {
        self.platform_id = Some(id.into());
        self
    }

    /// Set the source URL
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Reject requests whose text is blank after trimming.
    ///
    /// A blank platform is rejected too: it would produce keys like
    /// `_c-1` that collide across platforms.
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(Error::invalid_input("text must not be empty"));
        }
        if self.platform.trim().is_empty() {
            return Err(Error::invalid_input("platform must not be empty"));
        }
        Ok(())
    }

    /// Dedup key for this request
    pub fn dedup_key(&self) -> String {
        dedup_key(&self.platform, self.platform_id.as_deref(), &self.text)
    }
}
