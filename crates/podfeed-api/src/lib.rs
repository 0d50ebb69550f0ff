//! Axum HTTP API server.
//!
//! This crate provides:
//! - Feed creation with privilege gating
//! - RSS rendering of provider collections, cached for a few minutes
//! - Download redirects to resolved media URLs
//! - Rate limiting, security headers and Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod rss;
pub mod security;
pub mod services;
pub mod state;

pub use auth::Caller;
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::FeedService;
pub use state::AppState;
