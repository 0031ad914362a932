use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Opaque YouTube video identifier
///
/// Usually the 11-character id YouTube hands out, but nothing here relies on that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Matchers tried in order; the first one that captures a nonempty id wins
static URL_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("watch", r"[?&]v=([A-Za-z0-9_-]+)"),
        ("short-link", r"youtu\.be/([A-Za-z0-9_-]+)"),
        ("shorts", r"/shorts/([A-Za-z0-9_-]+)"),
        ("embed", r"/embed/([A-Za-z0-9_-]+)"),
        ("legacy", r"/v/([A-Za-z0-9_-]+)"),
    ]
    .into_iter()
    .filter_map(|(name, pattern)| Regex::new(pattern).ok().map(|re| (name, re)))
    .collect()
});

/// Extract the video id from a watch, youtu.be, shorts, embed or `/v/` link.
///
/// Returns `None` for empty input or when no pattern matches.
pub fn resolve(url: &str) -> Option<VideoId> {
    if url.is_empty() {
        return None;
    }

    URL_PATTERNS.iter().find_map(|(name, re)| {
        let id = re.captures(url)?.get(1)?.as_str();
        if id.is_empty() {
            return None;
        }
        tracing::debug!(pattern = *name, video_id = id, "resolved video id");
        Some(VideoId::new(id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(url: &str) -> Option<String> {
        resolve(url).map(|id| id.as_str().to_string())
    }

    #[test]
    fn test_watch_urls() {
        assert_eq!(resolved("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), Some("dQw4w9WgXcQ".into()));
        assert_eq!(resolved("https://m.youtube.com/watch?v=dQw4w9WgXcQ&t=42s"), Some("dQw4w9WgXcQ".into()));
        assert_eq!(
            resolved("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".into())
        );
    }

    #[test]
    fn test_short_links() {
        assert_eq!(resolved("https://youtu.be/dQw4w9WgXcQ"), Some("dQw4w9WgXcQ".into()));
        assert_eq!(resolved("https://youtu.be/dQw4w9WgXcQ?si=abcdef"), Some("dQw4w9WgXcQ".into()));
    }

    #[test]
    fn test_shorts_embed_and_legacy_paths() {
        assert_eq!(resolved("https://www.youtube.com/shorts/aBc_12-xYz0"), Some("aBc_12-xYz0".into()));
        assert_eq!(resolved("https://www.youtube.com/embed/dQw4w9WgXcQ?start=10"), Some("dQw4w9WgXcQ".into()));
        assert_eq!(resolved("https://www.youtube.com/v/dQw4w9WgXcQ"), Some("dQw4w9WgXcQ".into()));
    }

    #[test]
    fn test_id_is_returned_unchanged() {
        // No length check: whatever the pattern captures is the id
        assert_eq!(resolved("https://youtu.be/abc"), Some("abc".into()));
    }

    #[test]
    fn test_unrecognized_input() {
        assert_eq!(resolved(""), None);
        assert_eq!(resolved("not a url"), None);
        assert_eq!(resolved("https://www.youtube.com/"), None);
        assert_eq!(resolved("https://www.youtube.com/watch?v="), None);
        assert_eq!(resolved("https://vimeo.com/123456"), None);
    }
}
