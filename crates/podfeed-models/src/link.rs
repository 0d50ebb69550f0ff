//! Canonical link model and the link formatter.
//!
//! `make_link` is the inverse of [`crate::classifier::parse_link`]: given a
//! `(provider, link type, id)` triple it produces the canonical source URL
//! that provider APIs and `youtube-dl` understand.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::provider::{LinkType, Provider};

/// Result type for link operations.
pub type LinkResult<T> = Result<T, LinkError>;

/// Errors produced while classifying or formatting links.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("Link can't be empty")]
    NullLink,

    #[error("Invalid link: {0}")]
    InvalidLink(String),

    #[error("Unsupported provider or link type: {provider}/{link_type}")]
    UnsupportedLink {
        provider: Provider,
        link_type: LinkType,
    },

    #[error("Link id can't be empty")]
    MissingId,
}

impl LinkError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidLink(msg.into())
    }
}

/// Canonical `(provider, link type, id)` triple extracted from a URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkInfo {
    pub id: String,
    pub link_type: LinkType,
    pub provider: Provider,
}

impl LinkInfo {
    pub fn new(provider: Provider, link_type: LinkType, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            link_type,
            provider,
        }
    }

    /// Shorthand for a single-video link, used when re-resolving downloads.
    pub fn video(provider: Provider, id: impl Into<String>) -> Self {
        Self::new(provider, LinkType::Video, id)
    }

    /// True when no field is `Unknown` and the id is non-empty.
    pub fn is_resolved(&self) -> bool {
        !self.id.is_empty()
            && self.provider != Provider::Unknown
            && self.link_type != LinkType::Unknown
    }
}

/// URL template for a provider/link type pair; `{}` is replaced by the id.
fn template(provider: Provider, link_type: LinkType) -> Option<&'static str> {
    let template = match (provider, link_type) {
        (Provider::YouTube, LinkType::Video) => "https://youtube.com/watch?v={}",
        (Provider::YouTube, LinkType::Channel) => "https://youtube.com/channel/{}",
        (Provider::YouTube, LinkType::Playlist) => "https://youtube.com/playlist?list={}",
        (Provider::YouTube, LinkType::User) => "https://youtube.com/user/{}",
        (Provider::YouTube, LinkType::Info) => "https://youtube.com/get_video_info?video_id={}",

        (Provider::Vimeo, LinkType::Video) => "https://vimeo.com/{}",
        (Provider::Vimeo, LinkType::Category) => "https://vimeo.com/categories/{}",
        (Provider::Vimeo, LinkType::Channel) => "https://vimeo.com/channels/{}",
        (Provider::Vimeo, LinkType::Group) => "https://vimeo.com/groups/{}",
        (Provider::Vimeo, LinkType::User) => "https://vimeo.com/{}",
        (Provider::Vimeo, LinkType::Info) => "https://player.vimeo.com/video/{}/config",

        _ => return None,
    };

    Some(template)
}

/// Build the canonical source URL for a link.
///
/// # Errors
/// - [`LinkError::MissingId`] if `info.id` is empty
/// - [`LinkError::UnsupportedLink`] if no template exists for the pair
pub fn make_link(info: &LinkInfo) -> LinkResult<Url> {
    if info.id.trim().is_empty() {
        return Err(LinkError::MissingId);
    }

    let template = template(info.provider, info.link_type).ok_or(LinkError::UnsupportedLink {
        provider: info.provider,
        link_type: info.link_type,
    })?;

    let raw = template.replace("{}", &info.id);
    Url::parse(&raw).map_err(|e| LinkError::invalid(format!("{}: {}", raw, e)))
}

/// Per-item download URL consumed by the download redirect handler:
/// `{base}/download/{feed_id}/{video_id}.{ext}`.
pub fn download_link(base: &Url, feed_id: &str, video_id: &str, ext: &str) -> LinkResult<Url> {
    with_trailing_slash(base)
        .join(&format!("download/{}/{}.{}", feed_id, video_id, ext))
        .map_err(|e| LinkError::invalid(e.to_string()))
}

/// Public feed URL returned to the caller after creation: `{base}/{feed_id}`.
pub fn feed_link(base: &Url, feed_id: &str) -> LinkResult<Url> {
    with_trailing_slash(base)
        .join(feed_id)
        .map_err(|e| LinkError::invalid(e.to_string()))
}

fn with_trailing_slash(base: &Url) -> Url {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}
