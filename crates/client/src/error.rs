//! Errors surfaced by backend calls.

use shopcart_core::DomainError;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a response (connect failure, timeout, reset).
    #[error("network error: {0}")]
    Network(String),
    /// The backend answered with a non-2xx status.
    #[error("server error ({status}): {body}")]
    Server { status: u16, body: String },
    /// The response body was not the JSON we expected.
    #[error("decode error: {0}")]
    Decode(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ApiError {
    /// Whether repeating the same idempotent request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Server { status, .. } => *status >= 500,
            ApiError::Decode(_) | ApiError::Domain(_) => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}
