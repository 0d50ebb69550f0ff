//! Input validation for path parameters and shared secrets.

/// Longest feed id accepted in a path.
pub const MAX_FEED_ID_LENGTH: usize = 16;

/// Longest provider video id accepted in a path.
pub const MAX_VIDEO_ID_LENGTH: usize = 64;

/// Validate feed id format: lowercase alphanumerics, 1-16 chars.
pub fn is_valid_feed_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_FEED_ID_LENGTH
        && id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

/// Feed id from a feed path segment, accepting an optional `.xml` suffix.
pub fn feed_id_from_path(segment: &str) -> Option<&str> {
    let id = segment.strip_suffix(".xml").unwrap_or(segment);
    is_valid_feed_id(id).then_some(id)
}

/// Validate provider video id format.
///
/// Valid format: alphanumerics, hyphens and underscores. No path traversal.
pub fn is_valid_video_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_VIDEO_ID_LENGTH
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Video id from a download path segment; players append the file extension.
pub fn video_id_from_path(segment: &str) -> Option<&str> {
    let id = match segment.rsplit_once('.') {
        Some((id, _ext)) => id,
        None => segment,
    };
    is_valid_video_id(id).then_some(id)
}

/// Compare secrets without short-circuiting on the first differing byte.
pub fn secrets_match(expected: &str, provided: &str) -> bool {
    let (a, b) = (expected.as_bytes(), provided.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_id_validation() {
        assert_eq!(feed_id_from_path("ab12"), Some("ab12"));
        assert_eq!(feed_id_from_path("ab12.xml"), Some("ab12"));
        assert_eq!(feed_id_from_path(""), None);
        assert_eq!(feed_id_from_path("AB12"), None);
        assert_eq!(feed_id_from_path("abcdefghijklmnopq"), None);
        assert_eq!(feed_id_from_path("../etc"), None);
    }

    #[test]
    fn test_video_id_strips_extension() {
        assert_eq!(video_id_from_path("dQw4w9WgXcQ.mp4"), Some("dQw4w9WgXcQ"));
        assert_eq!(video_id_from_path("123456.m4a"), Some("123456"));
        assert_eq!(video_id_from_path("a-b_c"), Some("a-b_c"));
        assert_eq!(video_id_from_path("has/slash.mp4"), None);
        assert_eq!(video_id_from_path(".mp4"), None);
    }

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("s3cret", "s3cret"));
        assert!(!secrets_match("s3cret", "s3cres"));
        assert!(!secrets_match("s3cret", "s3cret!"));
    }
}
