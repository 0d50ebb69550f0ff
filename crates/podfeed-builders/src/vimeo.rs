//! Vimeo API client.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{BuilderError, BuilderResult};

pub const MAX_PAGE_SIZE: usize = 50;

/// Bytes per pixel-second used to approximate file sizes.
const SIZE_FACTOR: f64 = 0.38848958333;

/// Vimeo collection kinds and their API path prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Channel,
    Group,
    User,
    Category,
}

impl CollectionKind {
    pub fn path_prefix(&self) -> &'static str {
        match self {
            CollectionKind::Channel => "channels",
            CollectionKind::Group => "groups",
            CollectionKind::User => "users",
            CollectionKind::Category => "categories",
        }
    }
}

/// Channel, group, user or category metadata.
#[derive(Debug, Clone)]
pub struct VimeoCollection {
    pub name: String,
    pub description: String,
    pub link: String,
    pub thumbnail: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub author: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VimeoVideo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub link: String,
    pub thumbnail: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub duration_secs: u64,
    pub size: u64,
    pub author: Option<String>,
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct Pictures {
    #[serde(default)]
    sizes: Vec<PictureSize>,
}

impl Pictures {
    fn first_link(&self) -> Option<String> {
        self.sizes.first().map(|s| s.link.clone())
    }
}

#[derive(Debug, Deserialize)]
struct PictureSize {
    link: String,
}

#[derive(Debug, Deserialize)]
struct Owner {
    name: Option<String>,
}

/// Common shape of channels, groups, users and categories.
#[derive(Debug, Deserialize)]
struct CollectionResponse {
    #[serde(default)]
    name: String,
    description: Option<String>,
    /// Users carry a bio instead of a description
    bio: Option<String>,
    #[serde(default)]
    link: String,
    #[serde(default)]
    pictures: Option<Pictures>,
    created_time: Option<DateTime<Utc>>,
    user: Option<Owner>,
}

#[derive(Debug, Deserialize)]
struct VideosPage {
    #[serde(default)]
    data: Vec<VideoResponse>,
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoResponse {
    /// `/videos/{id}`
    uri: String,
    #[serde(default)]
    name: String,
    description: Option<String>,
    #[serde(default)]
    link: String,
    #[serde(default)]
    duration: u64,
    #[serde(default)]
    width: u64,
    #[serde(default)]
    height: u64,
    pictures: Option<Pictures>,
    created_time: Option<DateTime<Utc>>,
    user: Option<Owner>,
}

// =============================================================================
// Client
// =============================================================================

/// Vimeo REST API client authenticated with a bearer token.
#[derive(Clone)]
pub struct VimeoClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl VimeoClient {
    pub fn new(http: Client, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> BuilderResult<T> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(path, "Vimeo API request");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BuilderError::from_http_status(
                status.as_u16(),
                format!("{} failed: {}", path, body),
            ));
        }

        Ok(response.json().await?)
    }

    pub async fn collection(&self, kind: CollectionKind, id: &str) -> BuilderResult<VimeoCollection> {
        let path = format!("{}/{}", kind.path_prefix(), id);
        let resp: CollectionResponse = self.get(&path, &[]).await?;

        Ok(VimeoCollection {
            name: resp.name,
            description: resp.description.or(resp.bio).unwrap_or_default(),
            link: resp.link,
            thumbnail: resp.pictures.and_then(|p| p.first_link()),
            created_at: resp.created_time,
            author: resp.user.and_then(|u| u.name),
        })
    }

    /// Videos of a collection in upstream order, up to `count`.
    pub async fn videos(
        &self,
        kind: CollectionKind,
        id: &str,
        count: usize,
    ) -> BuilderResult<Vec<VimeoVideo>> {
        let path = format!("{}/{}/videos", kind.path_prefix(), id);
        let per_page = MAX_PAGE_SIZE.min(count.max(1));

        let mut videos = Vec::with_capacity(count);
        let mut page = 1usize;

        while videos.len() < count {
            let query = [
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
            ];
            let resp: VideosPage = self.get(&path, &query).await?;
            let fetched = resp.data.len();

            videos.extend(resp.data.into_iter().map(convert_video));

            let has_next = resp.paging.and_then(|p| p.next).is_some();
            if !has_next || fetched == 0 {
                break;
            }
            page += 1;
        }

        videos.truncate(count);
        Ok(videos)
    }
}

fn convert_video(v: VideoResponse) -> VimeoVideo {
    let id = v
        .uri
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();

    VimeoVideo {
        id,
        size: estimate_size(v.width, v.height, v.duration),
        title: v.name,
        description: v.description.unwrap_or_default(),
        link: v.link,
        thumbnail: v.pictures.and_then(|p| p.first_link()),
        created_at: v.created_time,
        duration_secs: v.duration,
        author: v.user.and_then(|u| u.name),
    }
}

/// Approximate size in bytes from frame dimensions and duration.
pub fn estimate_size(width: u64, height: u64, duration_secs: u64) -> u64 {
    (width as f64 * height as f64 * duration_secs as f64 * SIZE_FACTOR) as u64
}
