use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::locale::{localized, localized_field};
use crate::ojs::Listing;

const DEFAULT_AUTHOR: &str = "Editorial Team";
pub const DEFAULT_COUNT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementType {
    Deadline,
    Event,
    Alert,
    Update,
    News,
}

impl AnnouncementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnouncementType::Deadline => "deadline",
            AnnouncementType::Event => "event",
            AnnouncementType::Alert => "alert",
            AnnouncementType::Update => "update",
            AnnouncementType::News => "news",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// Type rules in evaluation order. Text matching none of them is `News`.
const TYPE_RULES: &[(AnnouncementType, &[&str])] = &[
    (AnnouncementType::Deadline, &["deadline", "submit by", "extended to"]),
    (AnnouncementType::Event, &["event", "webinar", "conference", "workshop"]),
    (AnnouncementType::Alert, &["alert", "maintenance", "downtime", "issue"]),
    (AnnouncementType::Update, &["update", "updated", "new", "improved"]),
];

/// Priority rules in evaluation order. Text matching none of them is `Low`.
const PRIORITY_RULES: &[(Priority, &[&str])] = &[
    (
        Priority::High,
        &["urgent", "critical", "important", "deadline", "downtime", "maintenance"],
    ),
    (Priority::Medium, &["alert", "notice", "update", "event"]),
];

/// Classify an announcement by keyword. First matching rule wins; the
/// `News`/`Low` defaults apply only when no keyword is present.
pub fn classify(title: &str, body: &str) -> (AnnouncementType, Priority) {
    let text = format!("{} {}", title, body).to_lowercase();
    let matches = |keywords: &[&str]| keywords.iter().any(|k| text.contains(k));

    let kind = TYPE_RULES
        .iter()
        .find(|(_, keywords)| matches(keywords))
        .map(|(kind, _)| *kind)
        .unwrap_or(AnnouncementType::News);
    let priority = PRIORITY_RULES
        .iter()
        .find(|(_, keywords)| matches(keywords))
        .map(|(priority, _)| *priority)
        .unwrap_or(Priority::Low);
    (kind, priority)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: AnnouncementType,
    pub priority: Priority,
    pub date_published: String,
    pub author: String,
}

impl Announcement {
    /// Build from one OJS announcement item.
    pub fn from_ojs(item: &Value) -> Self {
        let title = localized_field(item, "title");
        let content = ["description", "descriptionShort", "content"]
            .iter()
            .map(|key| localized_field(item, key))
            .find(|s| !s.is_empty())
            .unwrap_or_default();
        let (kind, priority) = classify(&title, &content);
        let date_published = item
            .get("datePosted")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        let author = item
            .get("author")
            .map(localized)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());

        Self {
            id: item.get("id").and_then(Value::as_i64).unwrap_or_default(),
            title,
            content,
            kind,
            priority,
            date_published,
            author,
        }
    }
}

/// Filter and page parameters for the announcements listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnouncementFilter {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub priority: Option<String>,
    pub count: Option<usize>,
    pub offset: Option<usize>,
}

impl AnnouncementFilter {
    /// Filter, then paginate. `itemsMax` counts matches before pagination.
    pub fn apply(&self, announcements: Vec<Announcement>) -> Listing<Announcement> {
        let kind = active(&self.kind);
        let priority = active(&self.priority);

        let filtered: Vec<Announcement> = announcements
            .into_iter()
            .filter(|a| kind.as_deref().map_or(true, |k| a.kind.as_str() == k))
            .filter(|a| priority.as_deref().map_or(true, |p| a.priority.as_str() == p))
            .collect();

        let total = filtered.len() as u64;
        let offset = self.offset.unwrap_or(0);
        let count = self.count.unwrap_or(DEFAULT_COUNT);
        let items = filtered.into_iter().skip(offset).take(count).collect();
        Listing::new(items, total)
    }
}

/// `None` for an absent, empty or `all` filter value.
fn active(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty() && v != "all")
}
