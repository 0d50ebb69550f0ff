//! youtube-dl format selection per provider and quality.

use podfeed_models::{Provider, Quality};

use crate::error::{MediaError, MediaResult};

/// Format selection string passed to `youtube-dl -f`.
///
/// Vimeo only serves video; audio qualities are rejected before any process is spawned.
pub fn format_for(provider: Provider, quality: Quality) -> MediaResult<&'static str> {
    let format = match (provider, quality) {
        (Provider::YouTube, Quality::VideoHigh) => "best[ext=mp4]",
        (Provider::YouTube, Quality::VideoLow) => "worst[ext=mp4]",
        (Provider::YouTube, Quality::AudioHigh) => "bestaudio[ext=m4a]/worstaudio[ext=m4a]",
        (Provider::YouTube, Quality::AudioLow) => "worstaudio[ext=m4a]/bestaudio[ext=m4a]",

        (Provider::Vimeo, Quality::VideoHigh) => "Original/http-1080p/http-720p/http-360p/http-270p",
        (Provider::Vimeo, Quality::VideoLow) => "http-270p/http-360p/http-540p/http-720p/http-1080p",
        (Provider::Vimeo, q) => {
            return Err(MediaError::unsupported_format(format!(
                "{} is not supported for Vimeo",
                q
            )))
        }

        (Provider::Unknown, _) => {
            return Err(MediaError::UnsupportedProvider(provider.to_string()))
        }
    };

    Ok(format)
}
