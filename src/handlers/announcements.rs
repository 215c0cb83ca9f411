use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Response,
};
use serde_json::Value;

use super::query_params;
use crate::announcements::{Announcement, AnnouncementFilter};
use crate::error::{ApiError, ApiResult};
use crate::ojs::{Collection, Listing, ResourceRef};
use crate::relay;
use crate::state::SharedState;

/// Upstream page the local filter works over.
const UPSTREAM_PAGE: u32 = 100;

pub async fn list_announcements(
    State(state): State<SharedState>,
    query: Result<Query<AnnouncementFilter>, QueryRejection>,
) -> ApiResult<Response> {
    let filter = query_params(query)?;
    let reference = ResourceRef::listing(Collection::Announcements)
        .query("count", UPSTREAM_PAGE)
        .query("orderBy", "datePosted")
        .query("orderDirection", "DESC");

    let listing: Listing<Value> = state
        .get_as(&reference)
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to fetch announcements", "Announcements not found"))?;

    let announcements = listing.items.iter().map(Announcement::from_ojs).collect();
    let page = filter.apply(announcements);
    tracing::debug!(
        "Announcements: {} upstream, {} matching, {} returned",
        listing.items.len(),
        page.items_max,
        page.items.len()
    );
    Ok(relay::json(&page))
}
