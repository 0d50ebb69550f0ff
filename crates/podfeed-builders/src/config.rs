//! Provider API configuration.

use std::time::Duration;

pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const VIMEO_API_BASE: &str = "https://api.vimeo.com";

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub youtube_api_key: String,
    pub vimeo_api_key: String,
    /// Overridable for tests and proxies
    pub youtube_api_base: String,
    pub vimeo_api_base: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            youtube_api_key: String::new(),
            vimeo_api_key: String::new(),
            youtube_api_base: YOUTUBE_API_BASE.to_string(),
            vimeo_api_base: VIMEO_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ProviderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            youtube_api_key: std::env::var("YOUTUBE_API_KEY").unwrap_or_default(),
            vimeo_api_key: std::env::var("VIMEO_API_KEY").unwrap_or_default(),
            youtube_api_base: std::env::var("YOUTUBE_API_BASE")
                .unwrap_or_else(|_| YOUTUBE_API_BASE.to_string()),
            vimeo_api_base: std::env::var("VIMEO_API_BASE")
                .unwrap_or_else(|_| VIMEO_API_BASE.to_string()),
            timeout: Duration::from_secs(
                std::env::var("PROVIDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("podfeed/", env!("CARGO_PKG_VERSION")))
            .build()
    }
}
