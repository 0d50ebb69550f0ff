//! Link classification: turn a user-pasted URL into a [`LinkInfo`].
//!
//! Supported shapes:
//! - `https://youtu.be/VIDEO_ID`
//! - `https://youtube.com/watch?v=VIDEO_ID` (a `list` parameter wins and yields a playlist)
//! - `https://youtube.com/watch/VIDEO_ID`, `https://youtube.com/v/VIDEO_ID`
//! - `https://youtube.com/playlist?list=PLAYLIST_ID`
//! - `https://youtube.com/channel/CHANNEL_ID[/...]`
//! - `https://youtube.com/user/USER_NAME[/...]`
//! - `https://youtube.com/embed/watch?v=VIDEO_ID`, `https://youtube.com/embed/v=VIDEO_ID`
//! - `https://youtube.com/attribution_link?u=/watch%3Fv%3DVIDEO_ID`
//! - `https://vimeo.com/groups/ID`, `/channels/ID`, `/categories/ID`, `/USER`
//!
//! URLs are untrusted input: anything that doesn't match a known shape is
//! rejected with [`LinkError::InvalidLink`].

use url::Url;

use crate::link::{LinkError, LinkInfo, LinkResult};
use crate::provider::{LinkType, Provider};

/// Classify a URL into a `(provider, link type, id)` triple.
pub fn parse_link(input: &str) -> LinkResult<LinkInfo> {
    let input = input.trim();
    if input.is_empty() {
        return Err(LinkError::NullLink);
    }

    let url = parse_url(input)?;

    let host = url
        .host_str()
        .map(|h| h.to_ascii_lowercase())
        .ok_or_else(|| LinkError::invalid(format!("{} has no host", input)))?;
    let host = host.strip_prefix("www.").unwrap_or(&host);

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let (provider, link_type, id) = match host {
        "youtu.be" => match segments.as_slice() {
            [id] => (Provider::YouTube, LinkType::Video, Some(id.to_string())),
            _ => return Err(LinkError::invalid(input)),
        },
        "youtube.com" | "m.youtube.com" => {
            let (link_type, id) = classify_youtube(&url, &segments);
            (Provider::YouTube, link_type, id)
        }
        "vimeo.com" => {
            let (link_type, id) = classify_vimeo(&segments);
            (Provider::Vimeo, link_type, id)
        }
        _ => {
            return Err(LinkError::invalid(format!(
                "{} is not a supported host",
                host
            )))
        }
    };

    match id {
        Some(id) if link_type != LinkType::Unknown && !id.trim().is_empty() => {
            Ok(LinkInfo::new(provider, link_type, id.trim()))
        }
        _ => Err(LinkError::invalid(input)),
    }
}

/// Accept scheme-less input such as `youtube.com/channel/x`.
fn parse_url(input: &str) -> LinkResult<Url> {
    match Url::parse(input) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{}", input))
            .map_err(|e| LinkError::invalid(format!("{}: {}", input, e))),
        Err(e) => Err(LinkError::invalid(format!("{}: {}", input, e))),
    }
}

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

// ============================================================================
// YouTube
// ============================================================================

fn classify_youtube(url: &Url, segments: &[&str]) -> (LinkType, Option<String>) {
    match segments {
        ["channel", id, ..] => (LinkType::Channel, Some(id.to_string())),
        ["user", id, ..] => (LinkType::User, Some(id.to_string())),
        ["watch", id] | ["v", id] => (LinkType::Video, Some(id.to_string())),
        ["embed", "watch"] => (LinkType::Video, query_param(url, "v")),
        ["embed", rest] => match rest.strip_prefix("v=") {
            Some(id) => (LinkType::Video, Some(id.to_string())),
            None => (LinkType::Unknown, None),
        },
        ["watch"] => match query_param(url, "list") {
            Some(list) => (LinkType::Playlist, Some(list)),
            None => (LinkType::Video, query_param(url, "v")),
        },
        ["playlist"] => (LinkType::Playlist, query_param(url, "list")),
        ["attribution_link"] => (LinkType::Video, attribution_video_id(url)),
        _ => (LinkType::Unknown, None),
    }
}

/// `u` carries a relative URL such as `/watch?v=ID&feature=share`.
fn attribution_video_id(url: &Url) -> Option<String> {
    let nested = query_param(url, "u")?;
    let (_, query) = nested.split_once('?')?;

    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == "v")
        .map(|(_, v)| v.into_owned())
}

// ============================================================================
// Vimeo
// ============================================================================

fn classify_vimeo(segments: &[&str]) -> (LinkType, Option<String>) {
    match segments {
        ["groups", id, ..] => (LinkType::Group, Some(id.to_string())),
        ["channels", id, ..] => (LinkType::Channel, Some(id.to_string())),
        ["categories", id, ..] => (LinkType::Category, Some(id.to_string())),
        ["groups" | "channels" | "categories"] | [] => (LinkType::Unknown, None),
        [user, ..] => (LinkType::User, Some(user.to_string())),
    }
}
