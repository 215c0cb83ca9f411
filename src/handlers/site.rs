//! Routes that answer without a content fetch: site settings, the contact
//! form, and the upstream connectivity check.

use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{ApiError, ApiResult};
use crate::ojs::{Collection, ResourceRef};
use crate::state::SharedState;

pub async fn site_info(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(json!({ "submissionPortalUrl": state.config.submission_portal_url() }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub user_type: String,
}

impl ContactForm {
    fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() || self.email.trim().is_empty() || self.message.trim().is_empty() {
            return Err("Name, email and message are required");
        }
        if !self.email.contains('@') {
            return Err("Invalid email address");
        }
        Ok(())
    }
}

/// Accepts a contact message. Delivery is not wired up; the message is logged.
pub async fn contact(body: Result<Json<ContactForm>, JsonRejection>) -> ApiResult<Response> {
    let Json(form) = body.map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e.body_text())))?;
    form.validate().map_err(ApiError::bad_request)?;

    tracing::info!(
        "Contact message from {} <{}> ({}): {}",
        form.name.trim(),
        form.email.trim(),
        if form.user_type.is_empty() { "unspecified" } else { form.user_type.as_str() },
        form.subject.trim()
    );
    Ok(Json(json!({
        "success": true,
        "message": "Thank you for your message. We will get back to you soon."
    }))
    .into_response())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointCheck {
    pub endpoint: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

async fn check_endpoint(state: &SharedState, collection: Collection) -> EndpointCheck {
    let started = Instant::now();
    let outcome = state
        .get_json(&ResourceRef::listing(collection).query("count", 1))
        .await;
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    match outcome {
        Ok(_) => EndpointCheck {
            endpoint: collection.path(),
            ok: true,
            status: Some(200),
            duration_ms,
            error: None,
        },
        Err(e) => {
            tracing::warn!("OJS check of {} failed: {}", collection.path(), e);
            EndpointCheck {
                endpoint: collection.path(),
                ok: false,
                status: e.upstream_status(),
                duration_ms,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Reachability check for the configured OJS instance. Reports the key
/// length only, never the key.
pub async fn debug_ojs(State(state): State<SharedState>) -> ApiResult<Json<serde_json::Value>> {
    let creds = state.credentials().map_err(ApiError::from)?;
    let config = json!({
        "baseUrl": creds.base_url,
        "apiKeyLength": creds.api_key.len(),
    });

    let results = join_all(
        [Collection::Issues, Collection::Submissions]
            .into_iter()
            .map(|collection| check_endpoint(&state, collection)),
    )
    .await;

    Ok(Json(json!({
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "config": config,
        "results": results,
    })))
}
