//! YouTube Data API v3 client.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{BuilderError, BuilderResult};

/// API page size limit.
pub const MAX_RESULTS: usize = 50;

const HD_BYTES_PER_SECOND: u64 = 350_000;
const LD_BYTES_PER_SECOND: u64 = 100_000;

/// Channel lookup by id or legacy username.
#[derive(Debug, Clone)]
pub enum ChannelQuery {
    Id(String),
    Username(String),
}

#[derive(Debug, Clone)]
pub struct YouTubeChannel {
    pub id: String,
    /// Playlist holding every upload of the channel
    pub uploads_playlist_id: String,
    pub title: String,
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone)]
pub struct YouTubePlaylist {
    pub id: String,
    /// `"{channel title}: {playlist title}"`
    pub title: String,
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone)]
pub struct YouTubeVideo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub channel_title: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub duration_secs: u64,
    /// Approximation from duration and definition; the API doesn't expose sizes.
    pub size: u64,
    pub thumbnail: Option<String>,
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    channel_title: Option<String>,
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    thumbnails: HashMap<String, Thumbnail>,
    resource_id: Option<ResourceId>,
}

impl Snippet {
    fn best_thumbnail(&self) -> Option<String> {
        ["high", "medium", "default"]
            .iter()
            .find_map(|size| self.thumbnails.get(*size))
            .map(|t| t.url.clone())
    }
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    id: String,
    #[serde(default)]
    snippet: Snippet,
    content_details: ChannelContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    id: String,
    #[serde(default)]
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemsItem {
    #[serde(default)]
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    #[serde(default)]
    snippet: Snippet,
    content_details: Option<VideoContentDetails>,
}

#[derive(Debug, Deserialize)]
struct VideoContentDetails {
    #[serde(default)]
    duration: String,
    #[serde(default)]
    definition: String,
}

// =============================================================================
// Client
// =============================================================================

/// YouTube Data API client.
#[derive(Clone)]
pub struct YouTubeClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(http: Client, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn list<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, String)],
    ) -> BuilderResult<ListResponse<T>> {
        let url = format!("{}/{}", self.base_url, resource);
        debug!(resource, "YouTube API request");

        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BuilderError::from_http_status(
                status.as_u16(),
                format!("{} failed: {}", resource, body),
            ));
        }

        Ok(response.json().await?)
    }

    pub async fn channel(&self, query: &ChannelQuery) -> BuilderResult<YouTubeChannel> {
        let filter = match query {
            ChannelQuery::Id(id) => ("id", id.clone()),
            ChannelQuery::Username(name) => ("forUsername", name.clone()),
        };
        let params = [
            ("part", "id,snippet,contentDetails".to_string()),
            filter,
            ("maxResults", "1".to_string()),
        ];

        let response: ListResponse<ChannelItem> = self.list("channels", &params).await?;
        let item = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| BuilderError::not_found(format!("YouTube channel {:?}", query)))?;

        Ok(YouTubeChannel {
            thumbnail: item.snippet.best_thumbnail(),
            id: item.id,
            uploads_playlist_id: item.content_details.related_playlists.uploads,
            title: item.snippet.title,
            description: item.snippet.description,
            published_at: item.snippet.published_at,
        })
    }

    pub async fn playlist(&self, playlist_id: &str) -> BuilderResult<YouTubePlaylist> {
        let params = [
            ("part", "id,snippet".to_string()),
            ("id", playlist_id.to_string()),
            ("maxResults", "1".to_string()),
        ];

        let response: ListResponse<PlaylistItem> = self.list("playlists", &params).await?;
        let item = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| BuilderError::not_found(format!("YouTube playlist {}", playlist_id)))?;

        let snippet = item.snippet;
        let title = match &snippet.channel_title {
            Some(channel) => format!("{}: {}", channel, snippet.title),
            None => snippet.title.clone(),
        };

        Ok(YouTubePlaylist {
            thumbnail: snippet.best_thumbnail(),
            id: item.id,
            title,
            description: snippet.description,
            published_at: snippet.published_at,
        })
    }

    /// Video ids of a playlist, newest first, up to `count`.
    pub async fn playlist_item_ids(
        &self,
        playlist_id: &str,
        count: usize,
    ) -> BuilderResult<Vec<String>> {
        let mut ids = Vec::with_capacity(count);
        let mut token: Option<String> = None;

        while ids.len() < count {
            let page_size = MAX_RESULTS.min(count - ids.len());
            let mut params = vec![
                ("part", "id,snippet".to_string()),
                ("playlistId", playlist_id.to_string()),
                ("maxResults", page_size.to_string()),
            ];
            if let Some(t) = &token {
                params.push(("pageToken", t.clone()));
            }

            let response: ListResponse<PlaylistItemsItem> =
                self.list("playlistItems", &params).await?;

            ids.extend(
                response
                    .items
                    .into_iter()
                    .filter_map(|item| item.snippet.resource_id.and_then(|r| r.video_id)),
            );

            match response.next_page_token {
                Some(next) if !next.is_empty() => token = Some(next),
                _ => break,
            }
        }

        ids.truncate(count);
        Ok(ids)
    }

    /// Video details in the order of `ids`; ids the API doesn't return are skipped.
    pub async fn videos(&self, ids: &[String]) -> BuilderResult<Vec<YouTubeVideo>> {
        let mut videos = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(MAX_RESULTS) {
            let params = [
                ("part", "id,snippet,contentDetails".to_string()),
                ("id", chunk.join(",")),
                ("maxResults", chunk.len().to_string()),
            ];

            let response: ListResponse<VideoItem> = self.list("videos", &params).await?;
            let mut by_id: HashMap<String, VideoItem> = response
                .items
                .into_iter()
                .map(|item| (item.id.clone(), item))
                .collect();

            videos.extend(
                chunk
                    .iter()
                    .filter_map(|id| by_id.remove(id))
                    .map(convert_video),
            );
        }

        Ok(videos)
    }
}

fn convert_video(item: VideoItem) -> YouTubeVideo {
    let (duration_secs, definition) = match &item.content_details {
        Some(details) => (
            parse_iso8601_duration(&details.duration).unwrap_or(0),
            details.definition.as_str(),
        ),
        None => (0, ""),
    };

    YouTubeVideo {
        size: estimate_size(duration_secs, definition),
        thumbnail: item.snippet.best_thumbnail(),
        id: item.id,
        title: item.snippet.title,
        description: item.snippet.description,
        channel_title: item.snippet.channel_title,
        published_at: item.snippet.published_at,
        duration_secs,
    }
}

/// Approximate media size from duration and `hd`/`sd` definition.
pub fn estimate_size(duration_secs: u64, definition: &str) -> u64 {
    let rate = if definition == "hd" {
        HD_BYTES_PER_SECOND
    } else {
        LD_BYTES_PER_SECOND
    };
    duration_secs * rate
}

/// Parse an ISO 8601 duration such as `PT1H30M45S` or `P1DT2H` to whole seconds.
pub fn parse_iso8601_duration(duration: &str) -> Option<u64> {
    let rest = duration.strip_prefix('P')?;
    let mut seconds = 0f64;
    let mut number = String::new();
    let mut in_time = false;

    for c in rest.chars() {
        match c {
            'T' => in_time = true,
            '0'..='9' | '.' | ',' => number.push(if c == ',' { '.' } else { c }),
            _ => {
                let value: f64 = number.parse().ok()?;
                number.clear();
                let unit = match (c, in_time) {
                    ('W', false) => 7.0 * 86_400.0,
                    ('D', false) => 86_400.0,
                    ('H', true) => 3_600.0,
                    ('M', true) => 60.0,
                    ('S', true) => 1.0,
                    _ => return None,
                };
                seconds += value * unit;
            }
        }
    }

    if !number.is_empty() {
        return None;
    }

    Some(seconds.round() as u64)
}
