//! Short-form video URL detection and normalization.
//!
//! Given a raw user-pasted string, this module determines whether it is a
//! supported short-form video URL, which platform it belongs to, and
//! produces the canonical normalized form that the rest of the pipeline
//! uses as an idempotency key for job lookup.
//!
//! # Security
//! - URLs are treated as untrusted input
//! - Only whitelisted platform hosts are accepted
//! - Video ids and shortcodes are validated character-by-character
//! - No network calls; short-link hosts are canonicalized by pattern only

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::utils::{
    extract_instagram_reel_code, extract_tiktok_share_code, extract_tiktok_video,
    extract_youtube_id, host_of, is_instagram_host, is_tiktok_host, is_youtube_host,
    parse_lenient,
};

/// Supported short-form video platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    /// TikTok videos, including vm/vt share links
    Tiktok,
    /// YouTube Shorts, including youtu.be and watch links
    YoutubeShort,
    /// Instagram Reels, including /p/ post links
    InstagramReel,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Tiktok => "tiktok",
            Platform::YoutubeShort => "youtube-short",
            Platform::InstagramReel => "instagram-reel",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of analyzing a raw URL.
///
/// Computed synchronously on every input change; never persisted. The
/// `normalized_url` is the stable lookup key: two spellings of the same
/// video always produce the same value.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NormalizedUrlResult {
    /// Raw user input (untrusted)
    pub raw_url: String,

    /// Canonical normalized form, present only for supported URLs
    pub normalized_url: Option<String>,

    /// Detected platform, present only for supported URLs
    pub platform: Option<Platform>,

    /// Whether the URL can be submitted for processing
    pub is_supported: bool,
}

impl NormalizedUrlResult {
    fn unsupported(raw_url: &str) -> Self {
        Self {
            raw_url: raw_url.to_string(),
            normalized_url: None,
            platform: None,
            is_supported: false,
        }
    }

    fn supported(raw_url: &str, normalized_url: String, platform: Platform) -> Self {
        Self {
            raw_url: raw_url.to_string(),
            normalized_url: Some(normalized_url),
            platform: Some(platform),
            is_supported: true,
        }
    }
}

/// Detect the platform of a raw URL and compute its canonical form.
///
/// Pure and deterministic: the same input always yields the same output,
/// and equivalent spellings of the same video normalize identically
/// (`youtu.be/X` and `youtube.com/shorts/X` produce the same key).
/// Tracking parameters are stripped by construction because the canonical
/// form is rebuilt from the extracted id, never from the query string.
///
/// Empty or malformed input yields `is_supported = false` without
/// panicking.
///
/// # Example
/// ```
/// use clipnote_models::shortform_url::{detect, Platform};
///
/// let result = detect("https://youtu.be/dQw4w9WgXcQ?si=share123");
/// assert!(result.is_supported);
/// assert_eq!(result.platform, Some(Platform::YoutubeShort));
/// assert_eq!(
///     result.normalized_url.as_deref(),
///     Some("https://www.youtube.com/shorts/dQw4w9WgXcQ")
/// );
/// ```
pub fn detect(raw_url: &str) -> NormalizedUrlResult {
    let url = match parse_lenient(raw_url) {
        Some(url) => url,
        None => return NormalizedUrlResult::unsupported(raw_url),
    };

    let host = host_of(&url);

    if is_youtube_host(&host) {
        if let Some(id) = extract_youtube_id(&url) {
            return NormalizedUrlResult::supported(
                raw_url,
                format!("https://www.youtube.com/shorts/{}", id),
                Platform::YoutubeShort,
            );
        }
        return NormalizedUrlResult::unsupported(raw_url);
    }

    if is_tiktok_host(&host) {
        if let Some((handle, id)) = extract_tiktok_video(&url) {
            return NormalizedUrlResult::supported(
                raw_url,
                format!("https://www.tiktok.com/@{}/video/{}", handle, id),
                Platform::Tiktok,
            );
        }
        // Share links cannot be expanded to the full form without a
        // network lookup; they get their own stable canonical spelling
        // and the remote pipeline resolves the redirect.
        if let Some(code) = extract_tiktok_share_code(&url) {
            return NormalizedUrlResult::supported(
                raw_url,
                format!("https://www.tiktok.com/t/{}", code),
                Platform::Tiktok,
            );
        }
        return NormalizedUrlResult::unsupported(raw_url);
    }

    if is_instagram_host(&host) {
        if let Some(code) = extract_instagram_reel_code(&url) {
            return NormalizedUrlResult::supported(
                raw_url,
                format!("https://www.instagram.com/reel/{}/", code),
                Platform::InstagramReel,
            );
        }
        return NormalizedUrlResult::unsupported(raw_url);
    }

    NormalizedUrlResult::unsupported(raw_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Supported URL tests
    // ========================================================================

    #[test]
    fn test_youtube_shorts_url() {
        let result = detect("https://www.youtube.com/shorts/dQw4w9WgXcQ");
        assert!(result.is_supported);
        assert_eq!(result.platform, Some(Platform::YoutubeShort));
        assert_eq!(
            result.normalized_url.as_deref(),
            Some("https://www.youtube.com/shorts/dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_youtube_spellings_normalize_identically() {
        let spellings = [
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://youtube.com/shorts/dQw4w9WgXcQ?feature=share",
            "https://m.youtube.com/shorts/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?si=tracking&t=10",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&utm_source=share",
            "  https://youtu.be/dQw4w9WgXcQ  ",
        ];

        let keys: Vec<_> = spellings
            .iter()
            .map(|s| detect(s).normalized_url.expect("supported"))
            .collect();

        assert!(keys.iter().all(|k| k == &keys[0]), "keys differ: {:?}", keys);
    }

    #[test]
    fn test_tiktok_full_url() {
        let result = detect("https://www.tiktok.com/@creator/video/7312345678901234567?is_from_webapp=1");
        assert!(result.is_supported);
        assert_eq!(result.platform, Some(Platform::Tiktok));
        assert_eq!(
            result.normalized_url.as_deref(),
            Some("https://www.tiktok.com/@creator/video/7312345678901234567")
        );
    }

    #[test]
    fn test_tiktok_handle_case_insensitive() {
        let upper = detect("https://www.tiktok.com/@Creator/video/7312345678901234567");
        let lower = detect("https://www.tiktok.com/@creator/video/7312345678901234567");
        assert_eq!(upper.normalized_url, lower.normalized_url);
    }

    #[test]
    fn test_tiktok_share_links_normalize_identically() {
        let vm = detect("https://vm.tiktok.com/ZMabc123/");
        let t = detect("https://www.tiktok.com/t/ZMabc123?_r=1");
        assert!(vm.is_supported);
        assert_eq!(vm.platform, Some(Platform::Tiktok));
        assert_eq!(
            vm.normalized_url.as_deref(),
            Some("https://www.tiktok.com/t/ZMabc123")
        );
        assert_eq!(vm.normalized_url, t.normalized_url);
    }

    #[test]
    fn test_instagram_spellings_normalize_identically() {
        let reel = detect("https://www.instagram.com/reel/Cxyz_123/");
        let reels = detect("https://instagram.com/reels/Cxyz_123?igsh=tracker");
        let post = detect("https://www.instagram.com/p/Cxyz_123/");
        assert!(reel.is_supported);
        assert_eq!(reel.platform, Some(Platform::InstagramReel));
        assert_eq!(
            reel.normalized_url.as_deref(),
            Some("https://www.instagram.com/reel/Cxyz_123/")
        );
        assert_eq!(reel.normalized_url, reels.normalized_url);
        assert_eq!(reel.normalized_url, post.normalized_url);
    }

    #[test]
    fn test_scheme_less_input() {
        let result = detect("www.youtube.com/shorts/dQw4w9WgXcQ");
        assert!(result.is_supported);
    }

    // ========================================================================
    // Unsupported input tests
    // ========================================================================

    #[test]
    fn test_empty_and_malformed_input() {
        assert!(!detect("").is_supported);
        assert!(!detect("   ").is_supported);
        assert!(!detect("not a url").is_supported);
        assert!(!detect("https://").is_supported);
    }

    #[test]
    fn test_unknown_host() {
        let result = detect("https://vimeo.com/123456789");
        assert!(!result.is_supported);
        assert_eq!(result.platform, None);
        assert_eq!(result.normalized_url, None);
    }

    #[test]
    fn test_lookalike_host_rejected() {
        assert!(!detect("https://youtube.com.evil.io/shorts/dQw4w9WgXcQ").is_supported);
        assert!(!detect("https://nottiktok.com/@user/video/123").is_supported);
    }

    #[test]
    fn test_known_host_without_video_path() {
        assert!(!detect("https://www.youtube.com/@SomeChannel").is_supported);
        assert!(!detect("https://www.tiktok.com/@creator").is_supported);
        assert!(!detect("https://www.instagram.com/someuser/").is_supported);
    }

    #[test]
    fn test_detection_is_deterministic() {
        let a = detect("https://youtu.be/dQw4w9WgXcQ");
        let b = detect("https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(a.normalized_url, b.normalized_url);
        assert_eq!(a.platform, b.platform);
    }
}
