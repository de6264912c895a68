//! Share-link shape validation
//!
//! Only Steam UGC CDN links are accepted. Anything else is rejected before a
//! job record exists, so malformed input never touches the queue.

use thiserror::Error;

/// Required prefix for submitted share links.
pub const SHARE_URL_PREFIX: &str = "https://cdn.steamusercontent.com/ugc/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShareUrlError {
    #[error("link must start with `{SHARE_URL_PREFIX}`")]
    UnsupportedSource,

    #[error("link is missing the shared-clip path")]
    MissingPath,

    #[error("link must not contain whitespace")]
    ContainsWhitespace,
}

/// Check that a submitted link has the expected CDN host/path shape.
pub fn validate_share_url(url: &str) -> Result<(), ShareUrlError> {
    if !url.starts_with(SHARE_URL_PREFIX) {
        return Err(ShareUrlError::UnsupportedSource);
    }

    if url.len() == SHARE_URL_PREFIX.len() {
        return Err(ShareUrlError::MissingPath);
    }

    if url.chars().any(char::is_whitespace) {
        return Err(ShareUrlError::ContainsWhitespace);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_ugc_links() {
        assert!(validate_share_url("https://cdn.steamusercontent.com/ugc/12345/abcdef/").is_ok());
        assert!(validate_share_url("https://cdn.steamusercontent.com/ugc/1").is_ok());
    }

    #[test]
    fn test_rejects_other_hosts() {
        assert_eq!(
            validate_share_url("https://example.com/video.mp4"),
            Err(ShareUrlError::UnsupportedSource)
        );
        assert_eq!(
            validate_share_url("http://cdn.steamusercontent.com/ugc/1"),
            Err(ShareUrlError::UnsupportedSource)
        );
        assert_eq!(validate_share_url(""), Err(ShareUrlError::UnsupportedSource));
    }

    #[test]
    fn test_rejects_prefix_only() {
        assert_eq!(
            validate_share_url(SHARE_URL_PREFIX),
            Err(ShareUrlError::MissingPath)
        );
    }

    #[test]
    fn test_rejects_embedded_whitespace() {
        assert_eq!(
            validate_share_url("https://cdn.steamusercontent.com/ugc/123 456"),
            Err(ShareUrlError::ContainsWhitespace)
        );
    }
}
