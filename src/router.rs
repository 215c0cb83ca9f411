//! Axum router: maps every URL path to its handler.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{
    announcements::list_announcements,
    articles::{article, download, galley, preview, submission_publication, view},
    issues::{archive, current_issue, header, issue_articles, list_issues},
    journal::{journal_data, masthead, volumes},
    site::{contact, debug_ojs, site_info},
};
use crate::state::{AppState, SharedState};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    Router::new()
        // Issues
        .route("/api/issues",           get(list_issues))
        .route("/api/issues/current",   get(current_issue))
        .route("/api/issues/{issueId}", get(issue_articles))
        .route("/api/archive",          get(archive))
        .route("/api/header",           get(header))

        // Articles and galley files
        .route("/api/articles/{articleId}", get(article))
        .route("/api/articles/{articleId}/galleys/{galleyId}",  get(galley))
        .route("/api/articles/{articleId}/download/{galleyId}", get(download))
        .route("/api/articles/{articleId}/view/{galleyId}",     get(view))
        .route("/api/articles/{articleId}/preview/{galleyId}",  get(preview))
        .route(
            "/api/submissions/{submissionId}/publications/{publicationId}",
            get(submission_publication),
        )

        // Announcements and journal aggregate
        .route("/api/announcements",     get(list_announcements))
        .route("/api/journal",           get(journal_data))
        .route("/api/journal/volumes",   get(volumes))
        .route("/api/journal/masthead",  get(masthead))

        // Site
        .route("/api/site",      get(site_info))
        .route("/api/contact",   post(contact))
        .route("/api/debug-ojs", get(debug_ojs))

        // Middleware
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
