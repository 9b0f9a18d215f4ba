//! Runtime configuration, read from the environment.

use std::time::Duration;

use shopcart_client::ClientConfig;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Talk to the REST backend at `SHOPCART_API_URL`.
    #[default]
    Http,
    /// Serve a built-in demo inventory from memory.
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewKind {
    #[default]
    Terminal,
    Html,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppConfig {
    pub client: ClientConfig,
    pub backend: BackendKind,
    pub view: ViewKind,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}={value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut client = match lookup("SHOPCART_API_URL") {
            Some(url) if !url.trim().is_empty() => ClientConfig::new(url.trim()),
            Some(url) => return Err(ConfigError::invalid("SHOPCART_API_URL", &url, "must not be empty")),
            None => ClientConfig::default(),
        };

        if let Some(raw) = lookup("SHOPCART_GET_RETRIES") {
            client.get_retries = parse_number("SHOPCART_GET_RETRIES", &raw)?;
        }
        if let Some(raw) = lookup("SHOPCART_RETRY_DELAY_MS") {
            client.retry_delay = Duration::from_millis(parse_number("SHOPCART_RETRY_DELAY_MS", &raw)?);
        }
        if let Some(raw) = lookup("SHOPCART_TIMEOUT_MS") {
            let ms: u64 = parse_number("SHOPCART_TIMEOUT_MS", &raw)?;
            if ms == 0 {
                return Err(ConfigError::invalid("SHOPCART_TIMEOUT_MS", &raw, "must be positive"));
            }
            client.timeout = Some(Duration::from_millis(ms));
        }

        let backend = match lookup("SHOPCART_BACKEND").as_deref().map(str::trim) {
            None | Some("") | Some("http") => BackendKind::Http,
            Some("memory") => BackendKind::Memory,
            Some(other) => {
                return Err(ConfigError::invalid("SHOPCART_BACKEND", other, "expected `http` or `memory`"));
            }
        };

        let view = match lookup("SHOPCART_VIEW").as_deref().map(str::trim) {
            None | Some("") | Some("terminal") => ViewKind::Terminal,
            Some("html") => ViewKind::Html,
            Some(other) => {
                return Err(ConfigError::invalid("SHOPCART_VIEW", other, "expected `terminal` or `html`"));
            }
        };

        Ok(Self {
            client,
            backend,
            view,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(key, raw, e.to_string()))
}
