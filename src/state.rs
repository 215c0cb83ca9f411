//! Shared application state for the web server.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::{Config, OjsCredentials};
use crate::ojs::{fetch_as, FilePayload, OjsError, ResourceRef, Upstream};

/// Shared state injected into every Axum handler. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub upstream: Arc<dyn Upstream>,
}

impl AppState {
    pub fn new(config: Config, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            config: Arc::new(config),
            upstream,
        }
    }

    /// Credentials for this request, or `MissingConfig` before any I/O.
    pub fn credentials(&self) -> Result<OjsCredentials<'_>, OjsError> {
        self.config.credentials()
    }

    pub async fn get_json(&self, reference: &ResourceRef) -> Result<Value, OjsError> {
        let url = reference.resolve(&self.config)?;
        self.upstream.get_json(&url).await
    }

    pub async fn get_as<T: DeserializeOwned>(&self, reference: &ResourceRef) -> Result<T, OjsError> {
        let url = reference.resolve(&self.config)?;
        fetch_as(self.upstream.as_ref(), &url).await
    }

    pub async fn get_file(&self, reference: &ResourceRef) -> Result<FilePayload, OjsError> {
        let url = reference.resolve(&self.config)?;
        self.upstream.get_file(&url).await
    }
}

pub type SharedState = Arc<AppState>;
