pub mod client;
pub mod reference;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use client::OjsClient;
pub use reference::{Collection, ResourceRef};

/// The `{items, itemsMax}` envelope OJS uses for collections. Every listing
/// this service returns uses the same shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub items_max: u64,
}

impl<T> Listing<T> {
    pub fn new(items: Vec<T>, items_max: u64) -> Self {
        Self { items, items_max }
    }
}

/// A binary payload relayed from the upstream, with the headers we forward.
#[derive(Debug, Clone, Default)]
pub struct FilePayload {
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum OjsError {
    #[error("OJS configuration missing")]
    MissingConfig,
    #[error("Invalid OJS base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),
    /// Non-2xx answer. `path` never includes the query string, so the token
    /// stays out of logs.
    #[error("OJS API returned {status} for {path}")]
    Status { status: u16, path: String },
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for OjsError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest puts the full URL (token included) into its Display output.
        OjsError::Http(e.without_url())
    }
}

impl OjsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, OjsError::Status { status: 404, .. })
    }

    pub fn is_config(&self) -> bool {
        matches!(self, OjsError::MissingConfig | OjsError::InvalidBaseUrl(_))
    }

    /// Transport failures, throttling and server errors are worth another try.
    pub fn is_retryable(&self) -> bool {
        match self {
            OjsError::Http(_) => true,
            OjsError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Upstream status to echo back in the error envelope, if any.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            OjsError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Single-attempt-per-call access to the OJS API. Implementations own
/// timeouts and retries; callers only see the final outcome.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn get_json(&self, url: &Url) -> Result<Value, OjsError>;
    async fn get_file(&self, url: &Url) -> Result<FilePayload, OjsError>;
}

/// Fetch a JSON document and deserialize it into `T`.
pub async fn fetch_as<T: DeserializeOwned>(upstream: &dyn Upstream, url: &Url) -> Result<T, OjsError> {
    let value = upstream.get_json(url).await?;
    serde_json::from_value(value)
        .map_err(|e| OjsError::Parse(format!("unexpected response shape from {}: {}", url.path(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_defaults_missing_fields() {
        let listing: Listing<Value> = serde_json::from_str("{}").unwrap();
        assert!(listing.items.is_empty());
        assert_eq!(listing.items_max, 0);

        let listing: Listing<Value> =
            serde_json::from_str(r#"{"items":[{"id":1}],"itemsMax":7}"#).unwrap();
        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items_max, 7);
        assert_eq!(
            serde_json::to_value(&listing).unwrap(),
            serde_json::json!({"items":[{"id":1}],"itemsMax":7})
        );
    }

    #[test]
    fn test_retryable_statuses() {
        let status = |s| OjsError::Status { status: s, path: "/issues".into() };
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
        assert!(status(429).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!status(401).is_retryable());
        assert!(!OjsError::MissingConfig.is_retryable());
        assert!(status(404).is_not_found());
        assert_eq!(status(404).upstream_status(), Some(404));
        assert_eq!(OjsError::MissingConfig.upstream_status(), None);
    }
}
