//! Media quality selectors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::provider::UnknownVariant;

/// Requested media variant for a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Quality {
    #[default]
    VideoHigh,
    VideoLow,
    AudioHigh,
    AudioLow,
}

impl Quality {
    pub const ALL: &'static [Quality] = &[
        Quality::VideoHigh,
        Quality::VideoLow,
        Quality::AudioHigh,
        Quality::AudioLow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::VideoHigh => "VideoHigh",
            Quality::VideoLow => "VideoLow",
            Quality::AudioHigh => "AudioHigh",
            Quality::AudioLow => "AudioLow",
        }
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, Quality::AudioHigh | Quality::AudioLow)
    }

    /// MIME type of the enclosure served for this quality.
    pub fn content_type(&self) -> &'static str {
        if self.is_audio() {
            "audio/mp4"
        } else {
            "video/mp4"
        }
    }

    /// File extension used in download links.
    pub fn extension(&self) -> &'static str {
        if self.is_audio() {
            "m4a"
        } else {
            "mp4"
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "videohigh" => Ok(Quality::VideoHigh),
            "videolow" => Ok(Quality::VideoLow),
            "audiohigh" => Ok(Quality::AudioHigh),
            "audiolow" => Ok(Quality::AudioLow),
            _ => Err(UnknownVariant::new("quality", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types() {
        assert_eq!(Quality::VideoHigh.content_type(), "video/mp4");
        assert_eq!(Quality::VideoLow.content_type(), "video/mp4");
        assert_eq!(Quality::AudioHigh.content_type(), "audio/mp4");
        assert_eq!(Quality::AudioLow.extension(), "m4a");
    }

    #[test]
    fn test_parse_roundtrip() {
        for q in Quality::ALL {
            assert_eq!(q.to_string().parse::<Quality>().unwrap(), *q);
        }
        assert_eq!("audiohigh".parse::<Quality>().unwrap(), Quality::AudioHigh);
        assert!("VideoUltra".parse::<Quality>().is_err());
    }

    #[test]
    fn test_default_is_video_high() {
        assert_eq!(Quality::default(), Quality::VideoHigh);
    }
}
