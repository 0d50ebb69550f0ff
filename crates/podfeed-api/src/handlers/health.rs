//! Health, readiness and status handlers.

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Placeholder reported for a failed probe.
const PROBE_ERROR: &str = "ERROR";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

/// Liveness: the process is up and serving.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis_rtt_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Readiness: 503 until the feed store answers a ping.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    match state.store.ping().await {
        Ok(rtt) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                ready: true,
                redis_rtt_ms: Some(rtt.as_millis() as u64),
                error: None,
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                redis_rtt_ms: None,
                error: Some(e.to_string()),
            }),
        ),
    }
}

/// Plain text diagnostics. Probe failures are reported inline, never raised.
pub async fn status(State(state): State<AppState>, uri: Uri) -> String {
    let redis = match state.store.ping().await {
        Ok(rtt) => format!("{:?}", rtt),
        Err(_) => PROBE_ERROR.to_string(),
    };
    let resolver = match state.resolver.version().await {
        Ok(version) => version,
        Err(_) => PROBE_ERROR.to_string(),
    };

    format!("Path: {}\r\nRedis: {}\r\nResolve: {}", uri.path(), redis, resolver)
}

pub async fn robots() -> &'static str {
    "User-agent: *\nAllow: /$\nDisallow: /\n"
}
