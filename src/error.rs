use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::ojs::OjsError;

pub const CONFIG_MISSING: &str = "OJS configuration missing";

/// Error returned by a handler, rendered as `{error, status?}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub upstream_status: Option<u16>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            upstream_status: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            upstream_status: Some(404),
            ..Self::new(StatusCode::NOT_FOUND, message)
        }
    }

    /// Map an upstream failure: configuration problems and generic failures
    /// become 500, an upstream 404 becomes `not_found`. Logs the cause.
    pub fn upstream(err: OjsError, failure: &str, not_found: &str) -> Self {
        if err.is_config() {
            tracing::error!("{}: {}", failure, err);
            return Self::new(StatusCode::INTERNAL_SERVER_ERROR, CONFIG_MISSING);
        }
        if err.is_not_found() {
            tracing::info!("{}: {}", not_found, err);
            return Self::not_found(not_found);
        }
        tracing::error!("{}: {}", failure, err);
        Self {
            upstream_status: err.upstream_status(),
            ..Self::new(StatusCode::INTERNAL_SERVER_ERROR, failure)
        }
    }
}

impl From<OjsError> for ApiError {
    fn from(err: OjsError) -> Self {
        ApiError::upstream(err, "Failed to fetch data from OJS", "Not found")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.upstream_status {
            Some(status) => json!({ "error": self.message, "status": status }),
            None => json!({ "error": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
