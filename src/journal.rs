//! Whole-journal view assembled from several OJS collections.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::OjsCredentials;
use crate::locale::{localized, localized_opt};
use crate::ojs::{fetch_as, Collection, Listing, OjsError, ResourceRef, Upstream};

const DEFAULT_COVER: &str = "/images/default-cover.jpg";
const FEATURED_COUNT: usize = 3;
const PUBLISHED_STATUS: u32 = 3;
const PAGE_SIZE: u32 = 100;

// ── Upstream shapes ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OjsIssue {
    pub id: i64,
    #[serde(default)]
    pub title: Value,
    pub volume: Option<i64>,
    pub number: Option<String>,
    pub year: Option<i64>,
    pub date_published: Option<String>,
    #[serde(default)]
    pub cover_image_url: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OjsSubmission {
    pub id: i64,
    pub current_publication_id: Option<i64>,
    #[serde(default)]
    pub publications: Vec<OjsPublication>,
    #[serde(default)]
    pub title: Value,
    #[serde(rename = "abstract", default)]
    pub abstract_text: Value,
    pub doi: Option<String>,
    pub date_published: Option<String>,
    pub issue: Option<OjsIssueRef>,
    pub section_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OjsIssueRef {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OjsPublication {
    pub id: i64,
    #[serde(default)]
    pub full_title: Value,
    #[serde(default)]
    pub title: Value,
    #[serde(rename = "abstract", default)]
    pub abstract_text: Value,
    #[serde(default)]
    pub authors: Vec<OjsAuthor>,
    pub date_published: Option<String>,
    pub issue_id: Option<i64>,
    pub section_id: Option<i64>,
    #[serde(rename = "pub-id::doi")]
    pub pub_id_doi: Option<String>,
    pub doi_object: Option<OjsDoi>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OjsDoi {
    pub doi: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OjsAuthor {
    pub full_name: Option<String>,
    #[serde(default)]
    pub given_name: Value,
    #[serde(default)]
    pub family_name: Value,
    pub orcid: Option<String>,
    #[serde(default)]
    pub affiliation: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OjsAnnouncement {
    pub id: i64,
    #[serde(default)]
    pub title: Value,
    #[serde(default)]
    pub description: Value,
    pub date_posted: Option<String>,
    pub date_expire: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OjsUser {
    pub full_name: Option<String>,
    #[serde(default)]
    pub given_name: Value,
    #[serde(default)]
    pub family_name: Value,
    #[serde(default)]
    pub user_groups: Vec<OjsUserGroup>,
    #[serde(default)]
    pub affiliation: Value,
    pub country: Option<String>,
    pub orcid: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OjsUserGroup {
    #[serde(default)]
    pub name: Value,
    pub role_id: i64,
}

// ── Output shapes ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orcid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub authors: Vec<Author>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub doi: String,
    pub publication_date: String,
    pub manuscript_type: String,
    pub volume: i64,
    pub issue: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub title: String,
    pub volume: i64,
    pub issue: i64,
    pub date: String,
    pub cover_image: String,
    pub article_count: usize,
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Volume {
    pub volume: i64,
    pub year: i64,
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorialMember {
    pub name: String,
    pub role: String,
    pub affiliation: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orcid: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Masthead {
    pub editor_in_chief: Vec<EditorialMember>,
    pub associate_editors: Vec<EditorialMember>,
    pub section_editors: Vec<EditorialMember>,
    pub editorial_board: Vec<EditorialMember>,
    pub managing_editor: Vec<EditorialMember>,
    pub technical_editor: Vec<EditorialMember>,
}

impl Masthead {
    /// Bucket for a user group role id, if the role appears on the masthead.
    fn bucket(&mut self, role_id: i64) -> Option<&mut Vec<EditorialMember>> {
        match role_id {
            14 => Some(&mut self.editor_in_chief),
            15 => Some(&mut self.associate_editors),
            16 => Some(&mut self.editorial_board),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalAnnouncement {
    pub id: String,
    pub title: String,
    pub content: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct YearRange {
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_volumes: usize,
    pub total_issues: usize,
    pub total_articles: usize,
    pub year_range: Option<YearRange>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalData {
    pub volumes: Vec<Volume>,
    pub latest_issue: Option<Issue>,
    pub featured_articles: Vec<Article>,
    pub masthead: Masthead,
    pub announcements: Vec<JournalAnnouncement>,
    pub stats: Stats,
}

// ── Fetching ────────────────────────────────────────────────────────────────

fn issues_ref() -> ResourceRef {
    ResourceRef::listing(Collection::Issues)
        .query("isPublished", "true")
        .query("count", PAGE_SIZE)
}

fn submissions_ref() -> ResourceRef {
    ResourceRef::listing(Collection::Submissions)
        .query("status", PUBLISHED_STATUS)
        .query("count", PAGE_SIZE)
}

fn announcements_ref() -> ResourceRef {
    ResourceRef::listing(Collection::Announcements)
}

fn users_ref() -> ResourceRef {
    ResourceRef::listing(Collection::Users).query("userGroupIds[]", "14,15,16")
}

async fn fetch_items<T: serde::de::DeserializeOwned>(
    upstream: &dyn Upstream,
    creds: &OjsCredentials<'_>,
    reference: ResourceRef,
) -> Result<Vec<T>, OjsError> {
    let url = reference.to_url(creds)?;
    let listing: Listing<T> = fetch_as(upstream, &url).await?;
    Ok(listing.items)
}

/// Fetch issues, submissions, announcements and users concurrently and
/// assemble the journal view. Any failed call fails the whole view.
pub async fn fetch_journal_data(
    upstream: &dyn Upstream,
    creds: &OjsCredentials<'_>,
) -> Result<JournalData, OjsError> {
    let (issues, submissions, announcements, users) = tokio::try_join!(
        fetch_items::<OjsIssue>(upstream, creds, issues_ref()),
        fetch_items::<OjsSubmission>(upstream, creds, submissions_ref()),
        fetch_items::<OjsAnnouncement>(upstream, creds, announcements_ref()),
        fetch_items::<OjsUser>(upstream, creds, users_ref()),
    )?;
    tracing::debug!(
        "Journal data: {} issues, {} submissions, {} announcements, {} users",
        issues.len(),
        submissions.len(),
        announcements.len(),
        users.len()
    );
    Ok(build_journal_data(issues, submissions, announcements, users))
}

pub async fn fetch_volumes(
    upstream: &dyn Upstream,
    creds: &OjsCredentials<'_>,
) -> Result<Vec<Volume>, OjsError> {
    let (issues, submissions) = tokio::try_join!(
        fetch_items::<OjsIssue>(upstream, creds, issues_ref()),
        fetch_items::<OjsSubmission>(upstream, creds, submissions_ref()),
    )?;
    Ok(build_volumes(&issues, &submissions))
}

pub async fn fetch_masthead(
    upstream: &dyn Upstream,
    creds: &OjsCredentials<'_>,
) -> Result<Masthead, OjsError> {
    let users = fetch_items::<OjsUser>(upstream, creds, users_ref()).await?;
    Ok(build_masthead(&users))
}

// ── Assembly ────────────────────────────────────────────────────────────────

pub fn build_journal_data(
    issues: Vec<OjsIssue>,
    mut submissions: Vec<OjsSubmission>,
    announcements: Vec<OjsAnnouncement>,
    users: Vec<OjsUser>,
) -> JournalData {
    let volumes = build_volumes(&issues, &submissions);
    let latest_issue = volumes.first().and_then(|v| v.issues.first()).cloned();

    let issue_index = index_issues(&issues);
    // Newest first; ISO dates order lexically.
    submissions.sort_by(|a, b| publication_date(b).cmp(&publication_date(a)));
    let featured_articles = submissions
        .iter()
        .take(FEATURED_COUNT)
        .map(|s| to_article(s, &issue_index))
        .collect();

    let years: Vec<i64> = issues.iter().filter_map(issue_year).collect();
    let year_range = match (years.iter().min(), years.iter().max()) {
        (Some(&start), Some(&end)) => Some(YearRange { start, end }),
        _ => None,
    };

    let stats = Stats {
        total_volumes: volumes.len(),
        total_issues: issues.len(),
        total_articles: submissions.len(),
        year_range,
    };

    JournalData {
        volumes,
        latest_issue,
        featured_articles,
        masthead: build_masthead(&users),
        announcements: announcements.iter().map(to_announcement).collect(),
        stats,
    }
}

/// Group issues by volume, keeping upstream order for both volumes and issues.
pub fn build_volumes(issues: &[OjsIssue], submissions: &[OjsSubmission]) -> Vec<Volume> {
    let issue_index = index_issues(issues);
    let mut volumes: Vec<Volume> = Vec::new();

    for issue in issues {
        let volume_number = issue.volume.unwrap_or_default();
        let articles: Vec<Article> = submissions
            .iter()
            .filter(|s| submission_issue_id(s) == Some(issue.id))
            .map(|s| to_article(s, &issue_index))
            .collect();

        let entry = Issue {
            id: issue.id.to_string(),
            title: localized(&issue.title),
            volume: volume_number,
            issue: issue_number(issue),
            date: issue.date_published.clone().unwrap_or_default(),
            cover_image: localized_opt(&issue.cover_image_url).unwrap_or_else(|| DEFAULT_COVER.to_string()),
            article_count: articles.len(),
            articles,
        };

        match volumes.iter_mut().find(|v| v.volume == volume_number) {
            Some(volume) => volume.issues.push(entry),
            None => volumes.push(Volume {
                volume: volume_number,
                year: issue_year(issue).unwrap_or_default(),
                issues: vec![entry],
            }),
        }
    }
    volumes
}

pub fn build_masthead(users: &[OjsUser]) -> Masthead {
    let mut masthead = Masthead::default();
    for user in users {
        // The first group decides where a member is listed.
        let Some(group) = user.user_groups.first() else {
            continue;
        };
        let member = EditorialMember {
            name: person_name(user.full_name.as_deref(), &user.given_name, &user.family_name),
            role: localized(&group.name),
            affiliation: localized(&user.affiliation),
            country: user.country.clone().unwrap_or_default(),
            orcid: user.orcid.clone().filter(|o| !o.is_empty()),
        };
        if let Some(bucket) = masthead.bucket(group.role_id) {
            bucket.push(member);
        }
    }
    masthead
}

fn index_issues(issues: &[OjsIssue]) -> HashMap<i64, (i64, i64)> {
    issues
        .iter()
        .map(|i| (i.id, (i.volume.unwrap_or_default(), issue_number(i))))
        .collect()
}

fn issue_number(issue: &OjsIssue) -> i64 {
    issue
        .number
        .as_deref()
        .and_then(|n| n.trim().parse().ok())
        .unwrap_or_default()
}

fn issue_year(issue: &OjsIssue) -> Option<i64> {
    issue.year.or_else(|| {
        issue
            .date_published
            .as_deref()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse().ok())
    })
}

/// The publication that represents the submission: the current one if
/// flagged, otherwise the last listed.
fn current_publication(submission: &OjsSubmission) -> Option<&OjsPublication> {
    submission
        .current_publication_id
        .and_then(|id| submission.publications.iter().find(|p| p.id == id))
        .or_else(|| submission.publications.last())
}

fn submission_issue_id(submission: &OjsSubmission) -> Option<i64> {
    current_publication(submission)
        .and_then(|p| p.issue_id)
        .or_else(|| submission.issue.as_ref().map(|i| i.id))
}

fn publication_date(submission: &OjsSubmission) -> String {
    current_publication(submission)
        .and_then(|p| p.date_published.clone())
        .or_else(|| submission.date_published.clone())
        .unwrap_or_default()
}

fn person_name(full_name: Option<&str>, given: &Value, family: &Value) -> String {
    if let Some(name) = full_name.filter(|n| !n.trim().is_empty()) {
        return name.trim().to_string();
    }
    format!("{} {}", localized(given), localized(family)).trim().to_string()
}

fn to_article(submission: &OjsSubmission, issues: &HashMap<i64, (i64, i64)>) -> Article {
    let publication = current_publication(submission);

    let title = publication
        .and_then(|p| localized_opt(&p.full_title).or_else(|| localized_opt(&p.title)))
        .unwrap_or_else(|| localized(&submission.title));
    let abstract_text = publication
        .and_then(|p| localized_opt(&p.abstract_text))
        .unwrap_or_else(|| localized(&submission.abstract_text));
    let doi = publication
        .and_then(|p| {
            p.doi_object
                .as_ref()
                .and_then(|d| d.doi.clone())
                .or_else(|| p.pub_id_doi.clone())
        })
        .or_else(|| submission.doi.clone())
        .unwrap_or_default();
    let authors = publication
        .map(|p| {
            p.authors
                .iter()
                .map(|a| Author {
                    name: person_name(a.full_name.as_deref(), &a.given_name, &a.family_name),
                    orcid: a.orcid.clone().filter(|o| !o.is_empty()),
                    affiliation: localized_opt(&a.affiliation),
                })
                .collect()
        })
        .unwrap_or_default();
    let section = publication.and_then(|p| p.section_id).or(submission.section_id);
    let (volume, issue) = submission_issue_id(submission)
        .and_then(|id| issues.get(&id).copied())
        .unwrap_or_default();

    Article {
        id: submission.id.to_string(),
        title,
        authors,
        abstract_text,
        doi,
        publication_date: publication_date(submission),
        manuscript_type: section.map(|s| s.to_string()).unwrap_or_else(|| "undefined".to_string()),
        volume,
        issue,
    }
}

fn to_announcement(a: &OjsAnnouncement) -> JournalAnnouncement {
    JournalAnnouncement {
        id: a.id.to_string(),
        title: localized(&a.title),
        content: localized(&a.description),
        date: a.date_posted.clone().unwrap_or_default(),
        expiry_date: a.date_expire.clone().filter(|d| !d.is_empty()),
    }
}
