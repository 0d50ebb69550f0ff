//! Feed creation, rendering and metadata handlers.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use podfeed_models::{CreateFeedRequest, LinkType, Provider, Quality};

use crate::auth::Caller;
use crate::error::{ApiError, ApiResult};
use crate::rss::RSS_CONTENT_TYPE;
use crate::security::{feed_id_from_path, is_valid_feed_id};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreateFeedResponse {
    pub url: String,
}

/// `POST /api/create`
pub async fn create_feed(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<CreateFeedRequest>,
) -> ApiResult<Json<CreateFeedResponse>> {
    let url = state.feeds.create(&req, &caller).await?;
    Ok(Json(CreateFeedResponse {
        url: url.to_string(),
    }))
}

/// `GET /{feed_id}` and `GET /feed/{feed_id}`
pub async fn get_feed(
    State(state): State<AppState>,
    Path(segment): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let feed_id = feed_id_from_path(&segment)
        .ok_or_else(|| ApiError::bad_request("Invalid feed id"))?;

    let body = state.feeds.rss(feed_id).await?;
    Ok(([(header::CONTENT_TYPE, RSS_CONTENT_TYPE)], body))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedMetadataResponse {
    pub id: String,
    pub provider: Provider,
    pub link_type: LinkType,
    pub quality: Quality,
    pub page_size: u32,
}

/// `GET /api/metadata/{feed_id}`
pub async fn get_metadata(
    State(state): State<AppState>,
    Path(feed_id): Path<String>,
) -> ApiResult<Json<FeedMetadataResponse>> {
    if !is_valid_feed_id(&feed_id) {
        return Err(ApiError::bad_request("Invalid feed id"));
    }

    let feed = state.feeds.metadata(&feed_id).await?;
    Ok(Json(FeedMetadataResponse {
        id: feed.id,
        provider: feed.provider,
        link_type: feed.link_type,
        quality: feed.quality,
        page_size: feed.page_size,
    }))
}
