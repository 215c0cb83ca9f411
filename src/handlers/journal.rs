use axum::{extract::State, response::Response};

use crate::error::{ApiError, ApiResult};
use crate::journal;
use crate::relay;
use crate::state::SharedState;

pub async fn journal_data(State(state): State<SharedState>) -> ApiResult<Response> {
    let fail = |e| ApiError::upstream(e, "Failed to fetch journal data", "Journal data not found");
    let creds = state.credentials().map_err(fail)?;
    let data = journal::fetch_journal_data(state.upstream.as_ref(), &creds)
        .await
        .map_err(fail)?;
    Ok(relay::json(&data))
}

pub async fn volumes(State(state): State<SharedState>) -> ApiResult<Response> {
    let fail = |e| ApiError::upstream(e, "Failed to fetch volumes", "Volumes not found");
    let creds = state.credentials().map_err(fail)?;
    let volumes = journal::fetch_volumes(state.upstream.as_ref(), &creds)
        .await
        .map_err(fail)?;
    Ok(relay::json(&volumes))
}

pub async fn masthead(State(state): State<SharedState>) -> ApiResult<Response> {
    let fail = |e| ApiError::upstream(e, "Failed to fetch masthead", "Masthead not found");
    let creds = state.credentials().map_err(fail)?;
    let masthead = journal::fetch_masthead(state.upstream.as_ref(), &creds)
        .await
        .map_err(fail)?;
    Ok(relay::json(&masthead))
}
