//! Feed metadata (persisted) and the feed document (derived, never stored).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::link::LinkInfo;
use crate::provider::{LinkType, Provider};
use crate::quality::Quality;

/// Page size used when none was requested or the caller is not privileged.
pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MIN_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 150;

/// Everything needed to rebuild a feed later, keyed by its short id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedMetadata {
    pub provider: Provider,
    pub link_type: LinkType,
    pub id: String,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patreon_id: Option<String>,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl FeedMetadata {
    /// Metadata for a classified link with default quality and page size.
    pub fn new(link: LinkInfo) -> Self {
        Self {
            provider: link.provider,
            link_type: link.link_type,
            id: link.id,
            quality: Quality::default(),
            page_size: DEFAULT_PAGE_SIZE,
            patreon_id: None,
        }
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    /// Clamped into `MIN_PAGE_SIZE..=MAX_PAGE_SIZE`.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE);
        self
    }

    pub fn with_patreon_id(mut self, patreon_id: impl Into<String>) -> Self {
        self.patreon_id = Some(patreon_id.into());
        self
    }

    /// The source collection this feed was created from.
    pub fn link(&self) -> LinkInfo {
        LinkInfo::new(self.provider, self.link_type, self.id.clone())
    }
}

/// One episode of a feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    /// Provider video id.
    pub id: String,
    pub title: String,
    pub description: String,
    /// Canonical page of the video on the provider.
    pub link: String,
    pub published_at: DateTime<Utc>,
    pub duration_secs: u64,
    /// Approximate size in bytes.
    pub file_size: u64,
    pub content_type: String,
    /// Our own redirecting download URL.
    pub download_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// A complete feed ready to be rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedDocument {
    pub guid: String,
    pub title: String,
    pub description: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub last_build_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub explicit: bool,
    #[serde(default)]
    pub items: Vec<FeedItem>,
}

impl FeedDocument {
    pub fn new(guid: impl Into<String>, title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            title: title.into(),
            description: String::new(),
            link: link.into(),
            published_at: None,
            last_build_date: Utc::now(),
            image: None,
            author: None,
            category: None,
            explicit: false,
            items: Vec::new(),
        }
    }
}
