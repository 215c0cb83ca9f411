//! Construction of OJS URLs for files, documents and collections.
//!
//! Every outbound URL in the service is built here, so the token parameter
//! and the path templates live in exactly one place.

use std::collections::BTreeMap;

use reqwest::Url;

use super::OjsError;
use crate::config::{Config, OjsCredentials};

/// Query parameter OJS reads the API token from.
pub const TOKEN_PARAM: &str = "apiToken";

/// Workflow stage galleys live in.
pub const PRODUCTION_STAGE_ID: u32 = 5;

const DOWNLOAD_FILE_PATH: &str = "$$$call$$$/api/file/file-api/download-file";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Issues,
    Submissions,
    Announcements,
    Users,
}

impl Collection {
    pub fn path(&self) -> &'static str {
        match self {
            Collection::Issues => "issues",
            Collection::Submissions => "submissions",
            Collection::Announcements => "announcements",
            Collection::Users => "users",
        }
    }
}

/// Which document below `submissions/{id}` a metadata reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataPart {
    Publications,
    Publication(u64),
    Galley(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    DownloadFile,
    ViewFile,
    Metadata(MetadataPart),
    Listing(Collection),
}

/// Identifies one OJS resource independently of where OJS is hosted.
/// Combined with [`OjsCredentials`] it becomes an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    kind: ResourceKind,
    article_id: Option<u64>,
    file_id: Option<u64>,
    stage_id: Option<u32>,
    extra_query: BTreeMap<String, String>,
}

impl ResourceRef {
    fn new(kind: ResourceKind, article_id: Option<u64>, file_id: Option<u64>) -> Self {
        Self {
            kind,
            article_id,
            file_id,
            stage_id: None,
            extra_query: BTreeMap::new(),
        }
    }

    /// Binary download through the file API.
    pub fn download(article_id: u64, file_id: u64) -> Self {
        Self::new(ResourceKind::DownloadFile, Some(article_id), Some(file_id))
    }

    /// Inline view of a submission file.
    pub fn view(article_id: u64, file_id: u64) -> Self {
        Self::new(ResourceKind::ViewFile, Some(article_id), Some(file_id))
    }

    pub fn publications(article_id: u64) -> Self {
        Self::new(ResourceKind::Metadata(MetadataPart::Publications), Some(article_id), None)
    }

    pub fn publication(article_id: u64, publication_id: u64) -> Self {
        Self::new(
            ResourceKind::Metadata(MetadataPart::Publication(publication_id)),
            Some(article_id),
            None,
        )
    }

    pub fn galley(article_id: u64, galley_id: u64) -> Self {
        Self::new(ResourceKind::Metadata(MetadataPart::Galley(galley_id)), Some(article_id), None)
    }

    pub fn listing(collection: Collection) -> Self {
        Self::new(ResourceKind::Listing(collection), None, None)
    }

    pub fn stage(mut self, stage_id: u32) -> Self {
        self.stage_id = Some(stage_id);
        self
    }

    /// Add a query parameter. Later values for the same key replace earlier
    /// ones; the token parameter is reserved and always set from credentials.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.extra_query.insert(key.into(), value.to_string());
        self
    }

    fn effective_stage(&self) -> Option<u32> {
        match self.kind {
            ResourceKind::DownloadFile | ResourceKind::ViewFile => {
                Some(self.stage_id.unwrap_or(PRODUCTION_STAGE_ID))
            }
            _ => self.stage_id,
        }
    }

    fn path(&self) -> String {
        let article = self.article_id.unwrap_or_default();
        let file = self.file_id.unwrap_or_default();
        match self.kind {
            ResourceKind::DownloadFile => DOWNLOAD_FILE_PATH.to_string(),
            ResourceKind::ViewFile => format!("submissions/{}/files/{}", article, file),
            ResourceKind::Metadata(part) => match part {
                MetadataPart::Publications => format!("submissions/{}/publications", article),
                MetadataPart::Publication(id) => format!("submissions/{}/publications/{}", article, id),
                MetadataPart::Galley(id) => format!("submissions/{}/galleys/{}", article, id),
            },
            ResourceKind::Listing(collection) => collection.path().to_string(),
        }
    }

    /// Build the absolute URL. Pure: no I/O happens here.
    pub fn to_url(&self, creds: &OjsCredentials<'_>) -> Result<Url, OjsError> {
        let base = creds.base_url.trim().trim_end_matches('/');
        if base.is_empty() || creds.api_key.trim().is_empty() {
            return Err(OjsError::MissingConfig);
        }

        let mut url = Url::parse(&format!("{}/{}", base, self.path()))
            .map_err(|e| OjsError::InvalidBaseUrl(e.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(OjsError::InvalidBaseUrl(format!("{} is not a hierarchical URL", base)));
        }

        let mut params: BTreeMap<String, String> = self
            .extra_query
            .iter()
            .filter(|(k, _)| k.as_str() != TOKEN_PARAM)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        if self.kind == ResourceKind::DownloadFile {
            params.insert("submissionFileId".into(), self.file_id.unwrap_or_default().to_string());
            params.insert("submissionId".into(), self.article_id.unwrap_or_default().to_string());
        }
        if let Some(stage) = self.effective_stage() {
            params.insert("stageId".into(), stage.to_string());
        }

        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &params {
                pairs.append_pair(key, value);
            }
            pairs.append_pair(TOKEN_PARAM, creds.api_key.trim());
        }
        Ok(url)
    }

    /// Build the URL from the process configuration, failing with
    /// `MissingConfig` when either setting is absent.
    pub fn resolve(&self, config: &Config) -> Result<Url, OjsError> {
        let creds = config.credentials()?;
        self.to_url(&creds)
    }
}
