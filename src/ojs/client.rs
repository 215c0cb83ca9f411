use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::Url;
use serde_json::Value;

use super::{FilePayload, OjsError, Upstream};
use crate::config::Config;

const USER_AGENT: &str = "journal-bff/0.1";
const INITIAL_BACKOFF: Duration = Duration::from_millis(250);

/// `reqwest`-backed [`Upstream`] with a per-request timeout and a small,
/// bounded retry budget.
pub struct OjsClient {
    client: reqwest::Client,
    max_retries: u32,
    backoff: Duration,
}

impl OjsClient {
    pub fn new(config: &Config) -> Result<Self, OjsError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            max_retries: config.max_retries,
            backoff: INITIAL_BACKOFF,
        })
    }

    async fn send(&self, url: &Url, accept: &str) -> Result<reqwest::Response, OjsError> {
        let mut attempt = 0u32;
        loop {
            let err = match self.client.get(url.clone()).header(ACCEPT, accept).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(resp),
                Ok(resp) => OjsError::Status {
                    status: resp.status().as_u16(),
                    path: url.path().to_string(),
                },
                Err(e) => OjsError::from(e),
            };

            if attempt >= self.max_retries || !err.is_retryable() {
                return Err(err);
            }
            let delay = self.backoff * 2u32.saturating_pow(attempt);
            tracing::warn!(
                "OJS request to {} failed ({}), retry {}/{} in {:?}",
                url.path(),
                err,
                attempt + 1,
                self.max_retries,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl Upstream for OjsClient {
    async fn get_json(&self, url: &Url) -> Result<Value, OjsError> {
        let resp = self.send(url, "application/json").await?;
        resp.json::<Value>()
            .await
            .map_err(|e| OjsError::Parse(format!("invalid JSON from {}: {}", url.path(), e.without_url())))
    }

    async fn get_file(&self, url: &Url) -> Result<FilePayload, OjsError> {
        let resp = self.send(url, "*/*").await?;
        let header = |name| {
            resp.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header(CONTENT_TYPE);
        let content_disposition = header(CONTENT_DISPOSITION);
        let bytes = resp.bytes().await?.to_vec();
        tracing::debug!("Relaying {} bytes from {}", bytes.len(), url.path());
        Ok(FilePayload {
            content_type,
            content_disposition,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

    async fn flaky(State(hits): State<Arc<AtomicUsize>>) -> Result<Json<Value>, StatusCode> {
        if hits.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(StatusCode::SERVICE_UNAVAILABLE)
        } else {
            Ok(Json(serde_json::json!({"items": [], "itemsMax": 0})))
        }
    }

    async fn missing(State(hits): State<Arc<AtomicUsize>>) -> StatusCode {
        hits.fetch_add(1, Ordering::SeqCst);
        StatusCode::NOT_FOUND
    }

    async fn slow(State(hits): State<Arc<AtomicUsize>>) -> Json<Value> {
        hits.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(500)).await;
        Json(serde_json::json!({"items": [], "itemsMax": 0}))
    }

    async fn pdf() -> ([(&'static str, &'static str); 2], &'static [u8]) {
        (
            [
                ("content-type", "application/pdf"),
                ("content-disposition", "attachment; filename=\"paper.pdf\""),
            ],
            b"%PDF-1.4",
        )
    }

    async fn spawn_upstream(hits: Arc<AtomicUsize>) -> String {
        let app = Router::new()
            .route("/flaky", get(flaky))
            .route("/missing", get(missing))
            .route("/slow", get(slow))
            .route("/file", get(pdf))
            .with_state(hits);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(max_retries: u32) -> OjsClient {
        client_with_timeout(max_retries, Duration::from_secs(5))
    }

    fn client_with_timeout(max_retries: u32, request_timeout: Duration) -> OjsClient {
        let config = Config {
            max_retries,
            request_timeout,
            ..Config::default()
        };
        let mut client = OjsClient::new(&config).unwrap();
        client.backoff = Duration::from_millis(10);
        client
    }

    #[tokio::test]
    async fn test_retries_server_error_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = spawn_upstream(hits.clone()).await;
        let url = Url::parse(&format!("{}/flaky?apiToken=secret", base)).unwrap();

        let value = client(1).get_json(&url).await.unwrap();
        assert_eq!(value["itemsMax"], 0);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_retry_budget_surfaces_status() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = spawn_upstream(hits.clone()).await;
        let url = Url::parse(&format!("{}/flaky?apiToken=secret", base)).unwrap();

        let err = client(0).get_json(&url).await.unwrap_err();
        assert!(matches!(err, OjsError::Status { status: 503, .. }));
        assert!(!err.to_string().contains("secret"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error_and_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = spawn_upstream(hits.clone()).await;
        let url = Url::parse(&format!("{}/slow?apiToken=secret", base)).unwrap();

        let err = client_with_timeout(1, Duration::from_millis(100))
            .get_json(&url)
            .await
            .unwrap_err();
        match &err {
            OjsError::Http(e) => assert!(e.is_timeout(), "{}", e),
            other => panic!("expected a transport error, got {:?}", other),
        }
        assert!(!err.to_string().contains("secret"));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = spawn_upstream(hits.clone()).await;
        let url = Url::parse(&format!("{}/missing", base)).unwrap();

        let err = client(3).get_json(&url).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_file_keeps_headers() {
        let base = spawn_upstream(Arc::new(AtomicUsize::new(0))).await;
        let url = Url::parse(&format!("{}/file", base)).unwrap();

        let payload = client(0).get_file(&url).await.unwrap();
        assert_eq!(payload.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(
            payload.content_disposition.as_deref(),
            Some("attachment; filename=\"paper.pdf\"")
        );
        assert_eq!(payload.bytes, b"%PDF-1.4");
    }
}
