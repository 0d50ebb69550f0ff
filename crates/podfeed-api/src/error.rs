//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use podfeed_builders::BuilderError;
use podfeed_media::MediaError;
use podfeed_models::LinkError;
use podfeed_storage::StorageError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Message returned for resolution failures other than an unavailable format.
pub const RESOLVE_FAILED_MESSAGE: &str = "Could not resolve URL";

/// Body detail for server errors when running in production.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// Request validation failure; the message is returned verbatim.
    #[error("{0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Feed error: {0}")]
    Builder(#[from] BuilderError),

    #[error(transparent)]
    Media(#[from] MediaError),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation(_) | ApiError::Link(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Config(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Storage(e) => match e {
                StorageError::NotFound(_) => StatusCode::NOT_FOUND,
                StorageError::InvalidKey => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Builder(e) => match e {
                BuilderError::UnsupportedProvider(_) | BuilderError::UnsupportedLinkType(_) => {
                    StatusCode::BAD_REQUEST
                }
                BuilderError::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Media(e) => match e {
                MediaError::UnsupportedFormat(_)
                | MediaError::UnsupportedProvider(_)
                | MediaError::Resolution { .. } => StatusCode::BAD_REQUEST,
                MediaError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Message shown to clients.
    fn detail(&self) -> String {
        match self {
            ApiError::Media(MediaError::Resolution { .. }) => RESOLVE_FAILED_MESSAGE.to_string(),
            _ => self.to_string(),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let ApiError::Storage(e) = &self {
            if e.is_integrity() {
                error!(error = %e, "Feed store integrity failure");
            }
        }
        if status.is_server_error() {
            error!(status = %status, error = %self, "Request failed");
        }

        let body = ErrorResponse {
            detail: self.detail(),
        };

        (status, Json(body)).into_response()
    }
}
