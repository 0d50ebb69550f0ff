//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Install the Prometheus recorder and return the handle used to render it.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "podfeed_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "podfeed_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "podfeed_http_requests_in_flight";

    // Feed metrics
    pub const FEEDS_CREATED_TOTAL: &str = "podfeed_feeds_created_total";
    pub const FEEDS_BUILT_TOTAL: &str = "podfeed_feeds_built_total";
    pub const FEED_ITEMS: &str = "podfeed_feed_items";

    // Download metrics
    pub const DOWNLOAD_REDIRECTS_TOTAL: &str = "podfeed_download_redirects_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "podfeed_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_feed_created(provider: &str) {
    let labels = [("provider", provider.to_string())];
    counter!(names::FEEDS_CREATED_TOTAL, &labels).increment(1);
}

/// Record a feed rebuilt from the provider API.
pub fn record_feed_built(provider: &str, items: usize) {
    let labels = [("provider", provider.to_string())];
    counter!(names::FEEDS_BUILT_TOTAL, &labels).increment(1);
    histogram!(names::FEED_ITEMS, &labels).record(items as f64);
}

pub fn record_download_redirect(provider: &str, outcome: &str) {
    let labels = [
        ("provider", provider.to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!(names::DOWNLOAD_REDIRECTS_TOTAL, &labels).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Collapse feed and video ids so label cardinality stays bounded.
fn sanitize_path(path: &str) -> String {
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    match segments.as_slice() {
        [""] => "/".to_string(),
        ["download", _, _] => "/download/:feed_id/:video_id".to_string(),
        ["feed", _] => "/feed/:feed_id".to_string(),
        ["api", "metadata", _] => "/api/metadata/:feed_id".to_string(),
        ["api", "create"] => "/api/create".to_string(),
        [single @ ("status" | "health" | "healthz" | "ready" | "metrics" | "robots.txt")] => {
            format!("/{}", single)
        }
        [_] => "/:feed_id".to_string(),
        _ => "/other".to_string(),
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
