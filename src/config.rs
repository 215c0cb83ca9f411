use std::net::SocketAddr;
use std::time::Duration;

use crate::ojs::OjsError;

const MAX_RETRIES_CAP: u32 = 5;
const DEFAULT_SUBMISSION_URL: &str = "https://dashboard.atghj.africa/index.php/journal/submission";

/// Server configuration loaded from environment variables.
///
/// The OJS settings are optional at startup; routes that need them fail
/// individually with [`OjsError::MissingConfig`].
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub ojs_api_url: Option<String>,
    pub ojs_api_key: Option<String>,
    pub submission_url: Option<String>,
    pub request_timeout: Duration,
    pub max_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            ojs_api_url: None,
            ojs_api_key: None,
            submission_url: None,
            request_timeout: Duration::from_secs(10),
            max_retries: 1,
        }
    }
}

/// The two settings every OJS request needs, both guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OjsCredentials<'a> {
    pub base_url: &'a str,
    pub api_key: &'a str,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup. Blank values count as unset;
    /// unparsable values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |key: &str| non_empty(lookup(key));

        let bind_addr = var("BFF_BIND_ADDR")
            .and_then(|s| match s.parse() {
                Ok(addr) => Some(addr),
                Err(e) => {
                    tracing::warn!("Ignoring invalid BFF_BIND_ADDR {:?}: {}", s, e);
                    None
                }
            })
            .unwrap_or(defaults.bind_addr);

        let ojs_api_url = var("OJS_API_URL").or_else(|| var("NEXT_PUBLIC_OJS_API_URL"));
        let ojs_api_key = var("OJS_API_KEY").or_else(|| var("NEXT_PUBLIC_OJS_API_KEY"));
        let submission_url = var("SUBMISSION_URL");

        let request_timeout = var("OJS_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let max_retries = var("OJS_MAX_RETRIES")
            .and_then(|s| s.parse::<u32>().ok())
            .map(|n| n.min(MAX_RETRIES_CAP))
            .unwrap_or(defaults.max_retries);

        Self {
            bind_addr,
            ojs_api_url,
            ojs_api_key,
            submission_url,
            request_timeout,
            max_retries,
        }
    }

    #[cfg(test)]
    pub fn with_upstream(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            ojs_api_url: Some(base_url.into()),
            ojs_api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Base URL and token, or `MissingConfig` if either is absent or blank.
    pub fn credentials(&self) -> Result<OjsCredentials<'_>, OjsError> {
        let base_url = self.ojs_api_url.as_deref().map(str::trim).unwrap_or("");
        let api_key = self.ojs_api_key.as_deref().map(str::trim).unwrap_or("");
        if base_url.is_empty() || api_key.is_empty() {
            return Err(OjsError::MissingConfig);
        }
        Ok(OjsCredentials { base_url, api_key })
    }

    pub fn submission_portal_url(&self) -> &str {
        self.submission_url.as_deref().unwrap_or(DEFAULT_SUBMISSION_URL)
    }

    /// Log which settings are present, never their values.
    pub fn log_summary(&self) {
        tracing::info!(
            "Config: bind={}, ojs_api_url={}, ojs_api_key={}, timeout={:?}, retries={}",
            self.bind_addr,
            if self.ojs_api_url.is_some() { "set" } else { "MISSING" },
            if self.ojs_api_key.is_some() { "set" } else { "MISSING" },
            self.request_timeout,
            self.max_retries,
        );
        if self.credentials().is_err() {
            tracing::warn!("OJS_API_URL / OJS_API_KEY not set: OJS-backed routes will answer 500");
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_require_both_settings() {
        let mut config = Config::default();
        assert!(matches!(config.credentials(), Err(OjsError::MissingConfig)));

        config.ojs_api_url = Some("https://journal.example/api/v1".into());
        assert!(matches!(config.credentials(), Err(OjsError::MissingConfig)));

        config.ojs_api_key = Some("   ".into());
        assert!(matches!(config.credentials(), Err(OjsError::MissingConfig)));

        config.ojs_api_key = Some("secret".into());
        let creds = config.credentials().unwrap();
        assert_eq!(creds.base_url, "https://journal.example/api/v1");
        assert_eq!(creds.api_key, "secret");
    }

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| v.to_string())
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.bind_addr, SocketAddr::from(([127, 0, 0, 1], 3000)));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.max_retries, 1);
        assert!(config.ojs_api_url.is_none());
        assert!(config.submission_url.is_none());
    }

    #[test]
    fn test_from_lookup_public_fallbacks() {
        let config = Config::from_lookup(lookup(&[
            ("OJS_API_URL", "  "),
            ("NEXT_PUBLIC_OJS_API_URL", "https://journal.example/api/v1"),
            ("NEXT_PUBLIC_OJS_API_KEY", "public-key"),
            ("SUBMISSION_URL", ""),
        ]));
        assert_eq!(config.ojs_api_url.as_deref(), Some("https://journal.example/api/v1"));
        assert_eq!(config.ojs_api_key.as_deref(), Some("public-key"));
        assert!(config.submission_url.is_none());

        let config = Config::from_lookup(lookup(&[
            ("OJS_API_KEY", "primary"),
            ("NEXT_PUBLIC_OJS_API_KEY", "public-key"),
        ]));
        assert_eq!(config.ojs_api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn test_from_lookup_numeric_settings() {
        let config = Config::from_lookup(lookup(&[
            ("OJS_MAX_RETRIES", "12"),
            ("OJS_TIMEOUT_SECS", "30"),
            ("BFF_BIND_ADDR", "0.0.0.0:8080"),
        ]));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.bind_addr, SocketAddr::from(([0, 0, 0, 0], 8080)));

        let config = Config::from_lookup(lookup(&[
            ("OJS_MAX_RETRIES", "many"),
            ("OJS_TIMEOUT_SECS", "0"),
            ("BFF_BIND_ADDR", "localhost"),
        ]));
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.bind_addr, SocketAddr::from(([127, 0, 0, 1], 3000)));

        let config = Config::from_lookup(lookup(&[("OJS_TIMEOUT_SECS", "soon")]));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_submission_portal_default() {
        let mut config = Config::default();
        assert_eq!(config.submission_portal_url(), DEFAULT_SUBMISSION_URL);
        config.submission_url = Some("https://portal.example/submit".into());
        assert_eq!(config.submission_portal_url(), "https://portal.example/submit");
    }
}
