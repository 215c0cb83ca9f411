//! Issue listings, the current issue, and the site header summary.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    response::Response,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{parse_id, query_params};
use crate::error::{ApiError, ApiResult};
use crate::locale::{localized, localized_field, localized_opt};
use crate::ojs::{Collection, Listing, ResourceRef};
use crate::relay;
use crate::state::SharedState;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;
const ISSUE_ARTICLE_COUNT: u32 = 20;
const ARCHIVE_PAGE_SIZE: u32 = 100;

/// One issue with every localized field resolved for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub volume: Option<i64>,
    pub number: String,
    pub year: Option<i64>,
    pub date_published: String,
    pub cover_image_url: Option<String>,
    pub cover_image_alt_text: Option<String>,
    pub published_url: Option<String>,
}

impl IssueSummary {
    pub fn from_ojs(item: &Value) -> Self {
        let text = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            id: item.get("id").and_then(Value::as_i64).unwrap_or_default(),
            title: localized_field(item, "title"),
            description: localized_field(item, "description"),
            volume: item.get("volume").and_then(Value::as_i64),
            number: text("number").unwrap_or_default(),
            year: item.get("year").and_then(Value::as_i64).or_else(|| {
                text("datePublished")
                    .as_deref()
                    .and_then(parse_published)
                    .map(|d| i64::from(d.year()))
            }),
            date_published: text("datePublished").unwrap_or_default(),
            cover_image_url: item.get("coverImageUrl").and_then(localized_opt),
            cover_image_alt_text: item.get("coverImageAltText").and_then(localized_opt),
            published_url: text("publishedUrl").filter(|s| !s.is_empty()),
        }
    }
}

fn summarize(listing: Listing<Value>) -> Listing<IssueSummary> {
    let items = listing.items.iter().map(IssueSummary::from_ojs).collect();
    Listing::new(items, listing.items_max)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSort {
    #[default]
    Newest,
    Oldest,
}

impl IssueSort {
    fn direction(self) -> &'static str {
        match self {
            IssueSort::Newest => "DESC",
            IssueSort::Oldest => "ASC",
        }
    }

    /// Order a page by publication date. ISO dates compare lexically;
    /// undated issues sort as oldest.
    fn apply(self, issues: &mut [IssueSummary]) {
        match self {
            IssueSort::Newest => issues.sort_by(|a, b| b.date_published.cmp(&a.date_published)),
            IssueSort::Oldest => issues.sort_by(|a, b| a.date_published.cmp(&b.date_published)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct IssuesQuery {
    pub volume: Option<String>,
    pub year: Option<u32>,
    #[serde(default)]
    pub sort: IssueSort,
    pub page: Option<u32>,
    pub count: Option<u32>,
}

pub async fn list_issues(
    State(state): State<SharedState>,
    query: Result<Query<IssuesQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let params = query_params(query)?;
    let count = params.count.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let page = params.page.unwrap_or(1).max(1);

    let mut reference = ResourceRef::listing(Collection::Issues)
        .query("isPublished", "true")
        .query("orderBy", "datePublished")
        .query("orderDirection", params.sort.direction())
        .query("count", count)
        .query("offset", (page - 1).saturating_mul(count));
    if let Some(volume) = params.volume.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        reference = reference.query("volumes", volume);
    }
    if let Some(year) = params.year {
        reference = reference.query("years", year);
    }

    let listing: Listing<Value> = state
        .get_as(&reference)
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to fetch issues data", "Issues not found"))?;
    let mut issues = summarize(listing);
    params.sort.apply(&mut issues.items);
    Ok(relay::json(&issues))
}

fn current_issue_ref() -> ResourceRef {
    ResourceRef::listing(Collection::Issues)
        .query("isPublished", 1)
        .query("orderBy", "datePublished")
        .query("orderDirection", "DESC")
        .query("count", 1)
}

async fn fetch_current_issue(state: &SharedState) -> ApiResult<Value> {
    let listing: Listing<Value> = state
        .get_as(&current_issue_ref())
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to fetch current issue", "No published issues found"))?;
    listing
        .items
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found("No published issues found"))
}

pub async fn current_issue(State(state): State<SharedState>) -> ApiResult<Response> {
    let issue = fetch_current_issue(&state).await?;
    Ok(relay::json(&issue))
}

/// Published articles of one issue, in table-of-contents order.
pub async fn issue_articles(
    State(state): State<SharedState>,
    Path(issue_id): Path<String>,
) -> ApiResult<Response> {
    let issue_id = parse_id(&issue_id, "issue")?;
    let reference = ResourceRef::listing(Collection::Submissions)
        .query("issueIds", issue_id)
        .query("status", 3)
        .query("orderBy", "seq")
        .query("orderDirection", "ASC")
        .query("count", ISSUE_ARTICLE_COUNT);

    let listing: Listing<Value> = state
        .get_as(&reference)
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to fetch articles", "Issue not found"))?;
    Ok(relay::json(&listing))
}

#[derive(Debug, Default, Deserialize)]
pub struct ArchiveQuery {
    pub count: Option<u32>,
    pub offset: Option<u32>,
    pub year: Option<String>,
    pub volume: Option<String>,
}

pub async fn archive(
    State(state): State<SharedState>,
    query: Result<Query<ArchiveQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let params = query_params(query)?;
    let mut reference = ResourceRef::listing(Collection::Issues)
        .query("isPublished", 1)
        .query("orderBy", "datePublished")
        .query("orderDirection", "DESC")
        .query("count", params.count.unwrap_or(ARCHIVE_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE))
        .query("offset", params.offset.unwrap_or(0));
    if let Some(year) = params.year.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        reference = reference.query("years", year);
    }
    if let Some(volume) = params.volume.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        reference = reference.query("volumes", volume);
    }

    let listing: Listing<Value> = state
        .get_as(&reference)
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to fetch archive", "Archive not found"))?;
    Ok(relay::json(&summarize(listing)))
}

/// Compact view of the current issue for the site header.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderIssue {
    pub id: i64,
    pub volume: Option<i64>,
    pub number: Option<String>,
    pub year: Option<i64>,
    pub date_published: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_date: Option<String>,
}

/// Accepts `2025-10-01` as well as OJS's `2025-10-01 00:00:00`.
fn parse_published(date: &str) -> Option<NaiveDate> {
    date.get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

impl HeaderIssue {
    pub fn from_ojs(issue: &Value) -> Self {
        let date_published = issue
            .get("datePublished")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let published = date_published.as_deref().and_then(parse_published);

        Self {
            id: issue.get("id").and_then(Value::as_i64).unwrap_or_default(),
            volume: issue.get("volume").and_then(Value::as_i64),
            number: issue.get("number").and_then(Value::as_str).map(str::to_string),
            year: issue
                .get("year")
                .and_then(Value::as_i64)
                .or_else(|| published.map(|d| i64::from(d.year()))),
            date_published,
            title: issue.get("title").map(localized).unwrap_or_default(),
            month: published.map(|d| d.format("%B").to_string()),
            formatted_date: published.map(|d| d.format("%B %-d, %Y").to_string()),
        }
    }
}

pub async fn header(State(state): State<SharedState>) -> ApiResult<Response> {
    let issue = fetch_current_issue(&state).await?;
    Ok(relay::json(&HeaderIssue::from_ojs(&issue)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_issue_summary_resolves_locales() {
        let item = json!({
            "id": 3,
            "title": {"en": "Vol 5 No 2"},
            "description": {"fr_CA": "Desc"},
            "volume": 5,
            "number": "2",
            "year": 2025,
            "datePublished": "2025-10-01",
            "coverImageUrl": {"en": ""},
            "coverImageAltText": {"en_US": "Cover"},
            "publishedUrl": "https://journal.example/issue/view/3"
        });
        let summary = IssueSummary::from_ojs(&item);
        assert_eq!(summary.title, "Vol 5 No 2");
        assert_eq!(summary.description, "Desc");
        assert_eq!(summary.cover_image_url, None);
        assert_eq!(summary.cover_image_alt_text.as_deref(), Some("Cover"));
        assert_eq!(summary.volume, Some(5));
        assert_eq!(summary.number, "2");
    }

    #[test]
    fn test_issue_summary_year_from_date() {
        let summary = IssueSummary::from_ojs(&json!({"id": 1, "datePublished": "2023-06-01 00:00:00"}));
        assert_eq!(summary.year, Some(2023));
        let undated = IssueSummary::from_ojs(&json!({"id": 2}));
        assert_eq!(undated.year, None);
    }

    #[test]
    fn test_issue_sort_orders_page() {
        let mut issues: Vec<IssueSummary> = ["2024-04-01", "", "2025-10-01", "2023-06-01"]
            .iter()
            .enumerate()
            .map(|(i, date)| IssueSummary::from_ojs(&json!({"id": i, "datePublished": date})))
            .collect();

        IssueSort::Newest.apply(&mut issues);
        assert_eq!(issues.iter().map(|i| i.id).collect::<Vec<_>>(), vec![2, 0, 3, 1]);
        IssueSort::Oldest.apply(&mut issues);
        assert_eq!(issues.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 3, 0, 2]);
        assert_eq!(IssueSort::default(), IssueSort::Newest);
    }

    #[test]
    fn test_header_formatting() {
        let issue = json!({
            "id": 9,
            "volume": 5,
            "number": "2",
            "datePublished": "2025-10-01 00:00:00",
            "title": {"en_US": "Current"}
        });
        let header = HeaderIssue::from_ojs(&issue);
        assert_eq!(header.year, Some(2025));
        assert_eq!(header.month.as_deref(), Some("October"));
        assert_eq!(header.formatted_date.as_deref(), Some("October 1, 2025"));
        assert_eq!(header.title, "Current");
    }

    #[test]
    fn test_header_without_date() {
        let header = HeaderIssue::from_ojs(&json!({"id": 1, "year": 2024, "title": "T"}));
        assert_eq!(header.year, Some(2024));
        assert!(header.month.is_none());
        let value = serde_json::to_value(&header).unwrap();
        assert!(value.get("formattedDate").is_none());
    }
}
