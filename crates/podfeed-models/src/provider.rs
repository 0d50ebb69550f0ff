//! Video hosting providers and link types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// External video hosting platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Provider {
    #[default]
    Unknown,
    YouTube,
    Vimeo,
}

impl Provider {
    /// Name as persisted in feed rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Unknown => "Unknown",
            Provider::YouTube => "YouTube",
            Provider::Vimeo => "Vimeo",
        }
    }

    /// Detect the provider from a (lower-cased, `www.`-stripped) host name.
    pub fn from_host(host: &str) -> Self {
        match host {
            "youtube.com" | "m.youtube.com" | "youtu.be" => Provider::YouTube,
            "vimeo.com" | "player.vimeo.com" => Provider::Vimeo,
            _ => Provider::Unknown,
        }
    }

    /// Whether this provider can serve audio-only media.
    pub fn supports_audio(&self) -> bool {
        matches!(self, Provider::YouTube)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "youtube" => Ok(Provider::YouTube),
            "vimeo" => Ok(Provider::Vimeo),
            "unknown" => Ok(Provider::Unknown),
            _ => Err(UnknownVariant::new("provider", s)),
        }
    }
}

/// Kind of entity a link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LinkType {
    #[default]
    Unknown,
    Video,
    Channel,
    Playlist,
    User,
    Group,
    Category,
    Info,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::Unknown => "Unknown",
            LinkType::Video => "Video",
            LinkType::Channel => "Channel",
            LinkType::Playlist => "Playlist",
            LinkType::User => "User",
            LinkType::Group => "Group",
            LinkType::Category => "Category",
            LinkType::Info => "Info",
        }
    }

    /// Collections are the only link types a feed can be built from.
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            LinkType::Channel
                | LinkType::Playlist
                | LinkType::User
                | LinkType::Group
                | LinkType::Category
        )
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "video" => Ok(LinkType::Video),
            "channel" => Ok(LinkType::Channel),
            "playlist" => Ok(LinkType::Playlist),
            "user" => Ok(LinkType::User),
            "group" => Ok(LinkType::Group),
            "category" => Ok(LinkType::Category),
            "info" => Ok(LinkType::Info),
            "unknown" => Ok(LinkType::Unknown),
            _ => Err(UnknownVariant::new("link type", s)),
        }
    }
}

/// Error returned when parsing an enum from its persisted name fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}
