//! Storage configuration.

use std::time::Duration;

/// Salt used for feed ids since the first deployment; changing it orphans existing feeds.
pub const DEFAULT_HASHID_SALT: &str = "65fce519433f4218aa0cee6394225eea";
pub const DEFAULT_HASHID_MIN_LENGTH: usize = 4;

/// Expiry of a freshly created feed row.
pub const INITIAL_FEED_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Expiry applied on every successful load.
pub const IDLE_FEED_TTL: Duration = Duration::from_secs(90 * 24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Redis URL
    pub redis_url: String,
    /// Key of the feed id counter
    pub counter_key: String,
    pub hashid_salt: String,
    pub hashid_min_length: usize,
    pub initial_ttl: Duration,
    pub idle_ttl: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            counter_key: "keygen".to_string(),
            hashid_salt: DEFAULT_HASHID_SALT.to_string(),
            hashid_min_length: DEFAULT_HASHID_MIN_LENGTH,
            initial_ttl: INITIAL_FEED_TTL,
            idle_ttl: IDLE_FEED_TTL,
        }
    }
}

impl StorageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            counter_key: std::env::var("FEED_COUNTER_KEY").unwrap_or(defaults.counter_key),
            hashid_salt: std::env::var("HASHID_SALT").unwrap_or(defaults.hashid_salt),
            hashid_min_length: std::env::var("HASHID_MIN_LENGTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.hashid_min_length),
            initial_ttl: defaults.initial_ttl,
            idle_ttl: defaults.idle_ttl,
        }
    }
}
