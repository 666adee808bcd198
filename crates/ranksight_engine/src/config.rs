use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
    #[error("http client construction failed: {0}")]
    Client(String),
}

/// Transport tuning for the fetcher.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Response bodies above this size fail instead of buffering unbounded.
    pub max_response_bytes: u64,
    /// Additional trigger attempts after the initial one, for transient
    /// transport failures only.
    pub trigger_retry_limit: u32,
    pub retry_backoff_base: Duration,
    pub retry_backoff_cap: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_response_bytes: 2 * 1024 * 1024,
            trigger_retry_limit: 3,
            retry_backoff_base: Duration::from_millis(500),
            retry_backoff_cap: Duration::from_secs(4),
        }
    }
}

/// Engine construction parameters.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub base_url: String,
    pub fetch: FetchSettings,
}

impl EngineConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            fetch: FetchSettings::default(),
        }
    }

    pub(crate) fn parse_base_url(&self) -> Result<url::Url, ConfigError> {
        url::Url::parse(&self.base_url)
            .map_err(|err| ConfigError::InvalidBaseUrl(format!("{}: {err}", self.base_url)))
    }
}
