//! Feed builder error types.

use thiserror::Error;

use podfeed_models::{LinkError, LinkType, Provider};

/// Result type for feed building.
pub type BuilderResult<T> = Result<T, BuilderError>;

#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(Provider),

    #[error("URL type is not supported: {0}")]
    UnsupportedLinkType(LinkType),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Link(#[from] LinkError),
}

impl BuilderError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Map a non-success upstream status into an error.
    pub fn from_http_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            404 => Self::NotFound(message),
            _ => Self::RequestFailed(format!("HTTP {}: {}", status, message)),
        }
    }
}
