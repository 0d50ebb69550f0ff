//! Resolver configuration.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// youtube-dl executable name or path
    pub ytdl_path: String,
    /// Wall-clock limit per invocation
    pub timeout: Duration,
    /// Pause before the single retry of a transient failure
    pub retry_delay: Duration,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ytdl_path: "youtube-dl".to_string(),
            timeout: Duration::from_secs(60),
            retry_delay: Duration::from_secs(30),
        }
    }
}

impl MediaConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            ytdl_path: std::env::var("YTDL_PATH").unwrap_or_else(|_| "youtube-dl".to_string()),
            timeout: Duration::from_secs(
                std::env::var("YTDL_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            retry_delay: Duration::from_secs(
                std::env::var("YTDL_RETRY_DELAY_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }
}
