//! Download redirect handler.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use podfeed_models::{make_link, LinkInfo};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::security::{is_valid_feed_id, video_id_from_path};
use crate::state::AppState;

/// `GET /download/{feed_id}/{video_id}`
///
/// Resolves the video with the feed's quality and answers with a `302` to the
/// direct media URL. Resolution runs on its own task so a client that hangs up
/// doesn't abort it; the result still lands in the cache for the retry.
pub async fn download(
    State(state): State<AppState>,
    Path((feed_id, segment)): Path<(String, String)>,
) -> ApiResult<Response> {
    if !is_valid_feed_id(&feed_id) {
        return Err(ApiError::bad_request("Invalid feed id"));
    }
    let video_id =
        video_id_from_path(&segment).ok_or_else(|| ApiError::bad_request("Invalid video id"))?;

    let feed = state.store.load(&feed_id).await?;
    let page_url = make_link(&LinkInfo::video(feed.provider, video_id))?;
    debug!(feed_id = %feed_id, url = %page_url, quality = %feed.quality, "Resolving download");

    let resolver = state.resolver.clone();
    let quality = feed.quality;
    let task = tokio::spawn(async move { resolver.resolve(&page_url, quality).await });

    let resolved = match task.await {
        Ok(result) => result,
        Err(e) => return Err(ApiError::internal(format!("resolve task failed: {}", e))),
    };

    match resolved {
        Ok(url) => {
            metrics::record_download_redirect(feed.provider.as_str(), "ok");
            Ok((StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response())
        }
        Err(e) => {
            metrics::record_download_redirect(feed.provider.as_str(), "error");
            warn!(feed_id = %feed_id, video_id, error = %e, "Download resolution failed");
            Err(e.into())
        }
    }
}
