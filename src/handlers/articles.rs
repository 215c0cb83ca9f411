//! Article documents, galley metadata and galley file relaying.

use axum::{
    extract::{Path, State},
    response::Response,
};
use serde::Serialize;
use serde_json::Value;

use super::parse_id;
use crate::error::{ApiError, ApiResult};
use crate::ojs::ResourceRef;
use crate::relay::{self, Disposition};
use crate::state::SharedState;

const FILE_FAILED: &str = "Failed to download file";
const FILE_NOT_FOUND: &str = "File not found";

pub async fn article(
    State(state): State<SharedState>,
    Path(article_id): Path<String>,
) -> ApiResult<Response> {
    let article_id = parse_id(&article_id, "article")?;
    let reference = ResourceRef::publications(article_id).query("include", "publications.galleys");
    let document = state
        .get_json(&reference)
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to fetch article", "Article not found"))?;
    Ok(relay::json(&document))
}

pub async fn galley(
    State(state): State<SharedState>,
    Path((article_id, galley_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let article_id = parse_id(&article_id, "article")?;
    let galley_id = parse_id(&galley_id, "galley")?;
    let document = state
        .get_json(&ResourceRef::galley(article_id, galley_id))
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to fetch galley", "Galley not found"))?;
    Ok(relay::json(&document))
}

/// Submission file behind a galley: `submissionFileId`, then `file.id`, then
/// the galley id itself.
fn galley_file_id(galley: &Value, galley_id: u64) -> u64 {
    galley
        .get("submissionFileId")
        .and_then(Value::as_u64)
        .or_else(|| galley.pointer("/file/id").and_then(Value::as_u64))
        .unwrap_or(galley_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileRoute {
    Download,
    View,
    Preview,
}

impl FileRoute {
    fn reference(self, article_id: u64, file_id: u64) -> ResourceRef {
        match self {
            FileRoute::Download | FileRoute::Preview => ResourceRef::download(article_id, file_id),
            FileRoute::View => ResourceRef::view(article_id, file_id),
        }
    }

    fn disposition(self) -> Disposition {
        match self {
            FileRoute::Download => Disposition::Attachment,
            FileRoute::View | FileRoute::Preview => Disposition::Inline,
        }
    }
}

async fn relay_galley_file(
    state: &SharedState,
    route: FileRoute,
    article_id: &str,
    galley_id: &str,
) -> ApiResult<Response> {
    let article_id = parse_id(article_id, "article")?;
    let galley_id = parse_id(galley_id, "galley")?;

    let galley = state
        .get_json(&ResourceRef::galley(article_id, galley_id))
        .await
        .map_err(|e| ApiError::upstream(e, FILE_FAILED, FILE_NOT_FOUND))?;
    let file_id = galley_file_id(&galley, galley_id);
    tracing::debug!(
        "Galley {} of article {} resolves to file {} ({:?})",
        galley_id,
        article_id,
        file_id,
        route
    );

    let payload = state
        .get_file(&route.reference(article_id, file_id))
        .await
        .map_err(|e| ApiError::upstream(e, FILE_FAILED, FILE_NOT_FOUND))?;
    Ok(relay::file(payload, route.disposition(), article_id, file_id))
}

pub async fn download(
    State(state): State<SharedState>,
    Path((article_id, galley_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    relay_galley_file(&state, FileRoute::Download, &article_id, &galley_id).await
}

pub async fn view(
    State(state): State<SharedState>,
    Path((article_id, galley_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    relay_galley_file(&state, FileRoute::View, &article_id, &galley_id).await
}

pub async fn preview(
    State(state): State<SharedState>,
    Path((article_id, galley_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    relay_galley_file(&state, FileRoute::Preview, &article_id, &galley_id).await
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleyLink {
    pub galley_id: u64,
    pub download_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicationWithGalley {
    pub publication: Value,
    pub galley: GalleyLink,
}

/// Link to the PDF galley through this service's own download route.
fn pdf_galley_link(submission_id: u64, publication: &Value) -> GalleyLink {
    let pdf = publication
        .get("galleys")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .find(|g| {
            g.get("label")
                .and_then(Value::as_str)
                .is_some_and(|label| label.trim().eq_ignore_ascii_case("pdf"))
        })
        .and_then(|g| g.get("id").and_then(Value::as_u64));

    match pdf {
        Some(galley_id) => GalleyLink {
            galley_id,
            download_url: format!("/api/articles/{}/download/{}", submission_id, galley_id),
        },
        None => GalleyLink {
            galley_id: 0,
            download_url: String::new(),
        },
    }
}

pub async fn submission_publication(
    State(state): State<SharedState>,
    Path((submission_id, publication_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let submission_id = parse_id(&submission_id, "submission")?;
    let publication_id = parse_id(&publication_id, "publication")?;

    let publication = state
        .get_json(&ResourceRef::publication(submission_id, publication_id))
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to fetch publication", "Publication not found"))?;
    let galley = pdf_galley_link(submission_id, &publication);
    Ok(relay::json(&PublicationWithGalley { publication, galley }))
}
