//! Feed creation request.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::quality::Quality;

/// Body of `POST /api/create`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedRequest {
    #[validate(
        length(min = 1, message = "URL can't be empty"),
        url(message = "URL must be an absolute link")
    )]
    pub url: String,

    #[serde(default)]
    pub quality: Option<Quality>,

    #[serde(default)]
    #[validate(range(min = 50, max = 150, message = "Page size must be between 50 and 150"))]
    pub page_size: Option<u32>,
}

impl CreateFeedRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            quality: None,
            page_size: None,
        }
    }

    /// Validate and flatten the first failure into a user-facing message.
    pub fn check(&self) -> Result<(), String> {
        self.validate().map_err(|errors| {
            errors
                .field_errors()
                .into_iter()
                .flat_map(|(field, errs)| {
                    errs.iter().map(move |e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("Invalid {}", field))
                    })
                })
                .next()
                .unwrap_or_else(|| "Invalid request".to_string())
        })
    }
}
