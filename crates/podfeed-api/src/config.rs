//! API configuration.

use std::env;
use std::str::FromStr;

const DEFAULT_PORT: u16 = 5001;
const DEFAULT_BASE_URL: &str = "http://localhost:5001";
const DEFAULT_RATE_LIMIT_RPS: u32 = 10;
/// Create requests carry a URL and two small fields.
const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024;

/// HTTP front-end settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Prefix for the feed and download links handed to podcast clients.
    pub base_url: String,
    /// Allowed origins; `*` allows any.
    pub cors_origins: Vec<String>,
    /// Sustained requests per second per client IP on public routes.
    pub rate_limit_rps: u32,
    pub max_body_size: usize,
    /// `production` hides internal error details from response bodies.
    pub environment: String,
    /// Shared with the auth gateway. Without it the patron headers are ignored.
    pub gateway_secret: Option<String>,
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            base_url: DEFAULT_BASE_URL.to_string(),
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: DEFAULT_RATE_LIMIT_RPS,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            environment: "development".to_string(),
            gateway_secret: None,
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Read settings from the environment, keeping defaults for anything
    /// missing or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("API_HOST").unwrap_or(defaults.host),
            port: parsed("API_PORT").unwrap_or(defaults.port),
            base_url: env::var("BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|raw| split_origins(&raw))
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: parsed("RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            max_body_size: parsed("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            gateway_secret: env::var("GATEWAY_SECRET").ok().filter(|s| !s.is_empty()),
            metrics_enabled: env::var("METRICS_ENABLED")
                .map(|v| matches!(v.as_str(), "true" | "1"))
                .unwrap_or(defaults.metrics_enabled),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

fn parsed<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_origins_skips_blanks() {
        assert_eq!(
            split_origins("https://a.example, ,https://b.example,"),
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_production_is_case_insensitive() {
        let config = ApiConfig {
            environment: "Production".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.is_production());
        assert!(!ApiConfig::default().is_production());
    }
}
