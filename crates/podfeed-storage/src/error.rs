//! Storage error types.

use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Feed id can't be empty")]
    InvalidKey,

    #[error("Feed not found: {0}")]
    NotFound(String),

    #[error("Generated feed id already exists: {0}")]
    IdGeneration(String),

    #[error("Feed row is missing mandatory field '{0}'")]
    MissingField(&'static str),

    #[error("Feed row has invalid value '{value}' for field '{field}'")]
    InvalidField { field: &'static str, value: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl StorageError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn invalid_field(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            value: value.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Integrity failures that indicate a bug or corrupted data rather than bad input.
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            Self::IdGeneration(_) | Self::MissingField(_) | Self::InvalidField { .. }
        )
    }
}
