//! API routes.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{create_feed, download, get_feed, get_metadata, health, ready, robots, status};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, hide_server_errors, rate_limit_middleware, request_id, request_logging,
    security_headers, RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let rate_limiter = Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .route("/create", post(create_feed))
        .route("/metadata/:feed_id", get(get_metadata));

    // Feed readers and players poll these; rate limited per client IP.
    let public_routes = Router::new()
        .nest("/api", api_routes)
        .route("/feed/:feed_id", get(get_feed))
        .route("/download/:feed_id/:video_id", get(download))
        .route("/:feed_id", get(get_feed))
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready))
        .route("/status", get(status))
        .route("/robots.txt", get(robots));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    let mut app = Router::new()
        .merge(public_routes)
        .merge(health_routes)
        .merge(metrics_routes);
    if state.config.is_production() {
        app = app.layer(middleware::from_fn(hide_server_errors));
    }

    app.layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use podfeed_builders::ProviderConfig;
    use podfeed_media::{MediaConfig, MediaError, MediaResult, UrlExtractor};
    use podfeed_storage::{MemoryBackend, StorageConfig};

    use crate::auth::{GATEWAY_SECRET_HEADER, PATREON_ID_HEADER, PLEDGE_CENTS_HEADER};
    use crate::config::ApiConfig;
    use crate::error::INTERNAL_ERROR_MESSAGE;
    use crate::state::provider_builders;

    const BASE: &str = "http://localhost:5001";

    /// Maps page URLs to a fake CDN address, failing for `unavailable` ids.
    struct FakeExtractor {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl UrlExtractor for FakeExtractor {
        async fn extract(&self, page_url: &Url, format: &str) -> MediaResult<Url> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if page_url.as_str().contains("unavailable") {
                return Err(MediaError::unsupported_format(
                    "ERROR: requested format not available",
                ));
            }
            if page_url.as_str().contains("stalled") {
                return Err(MediaError::Timeout(Duration::from_secs(60)));
            }
            let direct = format!(
                "https://cdn.example/{}?fmt={}",
                page_url.query().unwrap_or_default(),
                format.len()
            );
            Ok(Url::parse(&direct).unwrap())
        }

        async fn version(&self) -> MediaResult<String> {
            Ok("2021.12.17".to_string())
        }
    }

    fn test_config() -> ApiConfig {
        ApiConfig {
            base_url: BASE.to_string(),
            gateway_secret: Some("s3cret".to_string()),
            ..ApiConfig::default()
        }
    }

    fn app_with(builders: podfeed_builders::BuilderRegistry) -> Router {
        app_with_config(test_config(), builders)
    }

    fn app_with_config(config: ApiConfig, builders: podfeed_builders::BuilderRegistry) -> Router {
        let media = MediaConfig {
            retry_delay: Duration::from_millis(1),
            ..MediaConfig::default()
        };
        let state = tokio_test::assert_ok!(AppState::from_parts(
            config,
            std::sync::Arc::new(MemoryBackend::new()),
            StorageConfig::default(),
            std::sync::Arc::new(FakeExtractor {
                calls: AtomicUsize::new(0),
            }),
            media,
            builders,
        ));
        create_router(state, None)
    }

    fn app() -> Router {
        app_with(podfeed_builders::BuilderRegistry::new())
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn create_request(body: serde_json::Value, privileged: bool) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/create")
            .header(header::CONTENT_TYPE, "application/json");
        if privileged {
            builder = builder
                .header(GATEWAY_SECRET_HEADER, "s3cret")
                .header(PATREON_ID_HEADER, "12345")
                .header(PLEDGE_CENTS_HEADER, "500");
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    /// Create a feed and return its id.
    async fn create(app: &Router, body: serde_json::Value, privileged: bool) -> String {
        let response = app
            .clone()
            .oneshot(create_request(body, privileged))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let url = json["url"].as_str().unwrap();
        assert!(url.starts_with("http://localhost:5001/"));
        url.rsplit('/').next().unwrap().to_string()
    }

    async fn get(app: &Router, uri: &str) -> axum::response::Response {
        app.clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_non_privileged_creation_is_downgraded() {
        let app = app();
        let body = serde_json::json!({
            "url": "https://www.youtube.com/playlist?list=PLCB9F975ECF01953C",
            "quality": "AudioHigh",
            "pageSize": 150
        });

        let feed_id = create(&app, body, false).await;
        let meta = body_json(get(&app, &format!("/api/metadata/{}", feed_id)).await).await;

        assert_eq!(meta["quality"], "VideoHigh");
        assert_eq!(meta["pageSize"], 50);
        assert_eq!(meta["linkType"], "Playlist");
    }

    #[tokio::test]
    async fn test_privileged_creation_keeps_selection() {
        let app = app();
        let body = serde_json::json!({
            "url": "https://www.youtube.com/playlist?list=PLCB9F975ECF01953C",
            "quality": "AudioHigh",
            "pageSize": 150
        });

        let feed_id = create(&app, body, true).await;
        let meta = body_json(get(&app, &format!("/api/metadata/{}", feed_id)).await).await;

        assert_eq!(meta["quality"], "AudioHigh");
        assert_eq!(meta["pageSize"], 150);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let app = app();

        let response = app
            .clone()
            .oneshot(create_request(
                serde_json::json!({ "url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ" }),
                false,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(create_request(
                serde_json::json!({ "url": "https://youtube.com/channel/UC1", "pageSize": 10 }),
                false,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["detail"],
            "Page size must be between 50 and 150"
        );
    }

    #[tokio::test]
    async fn test_download_redirects_to_resolved_url() {
        let app = app();
        let feed_id = create(
            &app,
            serde_json::json!({ "url": "https://youtube.com/channel/UC1" }),
            false,
        )
        .await;

        let response = get(&app, &format!("/download/{}/dQw4w9WgXcQ.mp4", feed_id)).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("https://cdn.example/v=dQw4w9WgXcQ"));
    }

    #[tokio::test]
    async fn test_download_unavailable_format_is_bad_request() {
        let app = app();
        let feed_id = create(
            &app,
            serde_json::json!({ "url": "https://youtube.com/channel/UC1" }),
            false,
        )
        .await;

        let response = get(&app, &format!("/download/{}/unavailable.mp4", feed_id)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let detail = body_json(response).await["detail"].as_str().unwrap().to_string();
        assert!(detail.contains("requested format not available"));
    }

    #[tokio::test]
    async fn test_download_timeout_is_gateway_timeout() {
        let app = app();
        let feed_id = create(
            &app,
            serde_json::json!({ "url": "https://youtube.com/channel/UC1" }),
            false,
        )
        .await;

        let response = get(&app, &format!("/download/{}/stalled.mp4", feed_id)).await;
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        let detail = body_json(response).await["detail"].as_str().unwrap().to_string();
        assert!(detail.contains("timed out"), "{}", detail);
    }

    #[tokio::test]
    async fn test_production_hides_server_error_details() {
        let config = ApiConfig {
            environment: "production".to_string(),
            ..test_config()
        };
        let app = app_with_config(config, podfeed_builders::BuilderRegistry::new());
        let feed_id = create(
            &app,
            serde_json::json!({ "url": "https://youtube.com/channel/UC1" }),
            false,
        )
        .await;

        let response = get(&app, &format!("/download/{}/stalled.mp4", feed_id)).await;
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body_json(response).await["detail"], INTERNAL_ERROR_MESSAGE);

        // Client errors keep their message.
        let response = get(&app, &format!("/download/{}/unavailable.mp4", feed_id)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let detail = body_json(response).await["detail"].as_str().unwrap().to_string();
        assert!(detail.contains("requested format not available"));
    }

    #[tokio::test]
    async fn test_unknown_feed_is_not_found() {
        let app = app();
        assert_eq!(get(&app, "/zzzz").await.status(), StatusCode::NOT_FOUND);
        assert_eq!(get(&app, "/download/zzzz/abc.mp4").await.status(), StatusCode::NOT_FOUND);
        assert_eq!(get(&app, "/NOT-AN-ID").await.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_status_reports_probes() {
        let app = app();
        let response = get(&app, "/status").await;
        assert_eq!(response.status(), StatusCode::OK);

        let text = body_text(response).await;
        assert!(text.contains("Path: /status"));
        assert!(text.contains("Resolve: 2021.12.17"));
        assert!(!text.contains("Redis: ERROR"));
    }

    #[tokio::test]
    async fn test_feed_is_rendered_from_provider_api() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/playlists"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{
                    "id": "PL1",
                    "snippet": { "title": "Talks", "channelTitle": "Conf" }
                }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/playlistItems"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{ "snippet": { "resourceId": { "videoId": "talk1" } } }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{
                    "id": "talk1",
                    "snippet": { "title": "Keynote", "publishedAt": "2021-06-01T09:00:00Z" },
                    "contentDetails": { "duration": "PT45M", "definition": "hd" }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let providers = ProviderConfig {
            youtube_api_base: server.uri(),
            ..ProviderConfig::default()
        };
        let builders = provider_builders(&providers, &Url::parse(BASE).unwrap()).unwrap();
        let app = app_with(builders);

        let feed_id = create(
            &app,
            serde_json::json!({ "url": "https://www.youtube.com/playlist?list=PL1" }),
            false,
        )
        .await;

        let response = get(&app, &format!("/{}", feed_id)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/rss+xml; charset=UTF-8"
        );
        let xml = body_text(response).await;
        assert!(xml.contains("<title>Conf: Talks</title>"));
        assert!(xml.contains(&format!("http://localhost:5001/download/{}/talk1.mp4", feed_id)));

        // Second fetch is served from the feeds cache; the videos mock expects one call.
        let response = get(&app, &format!("/feed/{}.xml", feed_id)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
