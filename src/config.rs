//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::api::RetryConfig;
use crate::auth::StoredToken;
use crate::error::ConfigError;
use crate::wizard::controller::DEFAULT_FLAG_TTL;

/// Host service configuration.
#[derive(Debug, Clone)]
pub struct WizardConfig {
    /// Base URL of the tour backend, without trailing slash.
    pub api_url: String,
    /// Bearer token for backend calls (None means calls fail unauthenticated).
    pub api_token: Option<StoredToken>,
    /// Flag store location; `:memory:` keeps flags for the process lifetime.
    pub db_path: PathBuf,
    /// Port for the host REST surface.
    pub port: u16,
    /// Lifetime of persisted step flags.
    pub flag_ttl: Duration,
    /// Draft fetch retry policy.
    pub retry: RetryConfig,
    /// Per-request timeout for backend calls.
    pub http_timeout: Duration,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000/api".to_string(),
            api_token: None,
            db_path: PathBuf::from("./data/tour-wizard.db"),
            port: 8080,
            flag_ttl: DEFAULT_FLAG_TTL,
            retry: RetryConfig::default(),
            http_timeout: Duration::from_secs(15),
        }
    }
}

impl WizardConfig {
    /// Load configuration from `TOUR_WIZARD_*` environment variables.
    ///
    /// Unparseable numbers fall back to their defaults; a malformed API URL or
    /// token expiry is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = match get("TOUR_WIZARD_API_URL") {
            Some(url) => validate_url(&url)?,
            None => defaults.api_url,
        };

        let expires_at = get("TOUR_WIZARD_API_TOKEN_EXPIRES_AT")
            .map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| ConfigError::InvalidValue {
                        key: "TOUR_WIZARD_API_TOKEN_EXPIRES_AT".to_string(),
                        message: e.to_string(),
                    })
            })
            .transpose()?;
        let api_token = get("TOUR_WIZARD_API_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .map(|t| StoredToken::new(t, expires_at));

        let db_path = get("TOUR_WIZARD_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let parse_u64 = |key: &str| get(key).and_then(|s| s.trim().parse::<u64>().ok());

        let port = get("TOUR_WIZARD_PORT")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.port);
        let flag_ttl = parse_u64("TOUR_WIZARD_FLAG_TTL_DAYS")
            .and_then(|days| days.checked_mul(86_400))
            .map(Duration::from_secs)
            .unwrap_or(defaults.flag_ttl);
        let retry = RetryConfig {
            max_retries: get("TOUR_WIZARD_FETCH_RETRIES")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.retry.max_retries),
            initial_delay: parse_u64("TOUR_WIZARD_FETCH_BACKOFF_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry.initial_delay),
            ..defaults.retry
        };
        let http_timeout = parse_u64("TOUR_WIZARD_HTTP_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.http_timeout);

        Ok(Self {
            api_url,
            api_token,
            db_path,
            port,
            flag_ttl,
            retry,
            http_timeout,
        })
    }

    /// Whether flags live only in memory.
    pub fn in_memory_store(&self) -> bool {
        self.db_path.as_os_str() == ":memory:"
    }
}

fn validate_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let valid = reqwest::Url::parse(trimmed)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false);
    if !valid {
        return Err(ConfigError::InvalidValue {
            key: "TOUR_WIZARD_API_URL".to_string(),
            message: format!("'{raw}' is not an http(s) URL"),
        });
    }
    Ok(trimmed.to_string())
}
