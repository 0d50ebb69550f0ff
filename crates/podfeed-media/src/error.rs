//! Error types for media resolution.

use std::time::Duration;

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while resolving direct media URLs.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("youtube-dl not found: {0}")]
    YtdlNotFound(String),

    /// The requested quality can't be served for this video or provider.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Unsupported provider for {0}")]
    UnsupportedProvider(String),

    #[error("youtube-dl failed: {message}")]
    ProcessFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("youtube-dl returned an invalid URL: {0}")]
    InvalidOutput(String),

    /// youtube-dl ran past its wall-clock limit and was killed. Not retried.
    #[error("youtube-dl timed out after {0:?}")]
    Timeout(Duration),

    /// All attempts failed with transient errors.
    #[error("Could not resolve URL after {attempts} attempts: {message}")]
    Resolution { message: String, attempts: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    pub fn unsupported_format(message: impl Into<String>) -> Self {
        Self::UnsupportedFormat(message.into())
    }

    pub fn process_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::ProcessFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Failures worth one more attempt after a pause.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ProcessFailed { .. } | Self::InvalidOutput(_) | Self::Io(_)
        )
    }
}
