pub mod announcements;
pub mod articles;
pub mod issues;
pub mod journal;
pub mod site;

use axum::extract::{rejection::QueryRejection, Query};

use crate::error::{ApiError, ApiResult};

/// Unwrap query parameters, answering a malformed query string with the
/// usual `{error}` body instead of axum's plain-text rejection.
pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    query
        .map(|Query(params)| params)
        .map_err(|e| ApiError::bad_request(format!("Invalid query parameters: {}", e.body_text())))
}

/// Parse a numeric path segment, answering 400 for anything else.
pub fn parse_id(raw: &str, what: &str) -> ApiResult<u64> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid {} ID", what)))
}
