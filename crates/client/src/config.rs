//! Client configuration.

use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Connection settings for [`crate::HttpShopClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL without trailing slash, e.g. `http://localhost:3000`.
    pub base_url: String,
    /// How many times a failed GET is repeated. Writes are never repeated.
    pub get_retries: u32,
    /// Delay before the first GET retry; doubles on each further attempt.
    pub retry_delay: Duration,
    /// Per-request timeout. `None` waits for the backend indefinitely.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            ..Self::default()
        }
    }

    pub fn with_retries(mut self, get_retries: u32, retry_delay: Duration) -> Self {
        self.get_retries = get_retries;
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            get_retries: 2,
            retry_delay: Duration::from_millis(200),
            timeout: None,
        }
    }
}

fn normalize_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
