//! Utility functions for short-form URL parsing.
//!
//! This module provides the shared, per-platform extraction helpers used
//! by the platform detector. Everything here is pure string/URL work:
//! no network lookups, no redirect resolution.

use url::Url;

/// Parse a raw user-pasted string into a [`Url`], tolerating a missing
/// scheme (`www.tiktok.com/...` is accepted as `https://www.tiktok.com/...`).
///
/// Returns `None` for anything that still fails to parse or has no host.
pub fn parse_lenient(raw: &str) -> Option<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = Url::parse(trimmed)
        .ok()
        .or_else(|| Url::parse(&format!("https://{}", trimmed)).ok())?;

    // Only http(s) URLs can refer to hosted video pages.
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return None;
    }

    parsed.host_str()?;
    Some(parsed)
}

/// Lowercased host of a parsed URL, with any leading `www.` kept intact
/// (host matching below lists both spellings explicitly).
pub fn host_of(url: &Url) -> String {
    url.host_str().unwrap_or_default().to_ascii_lowercase()
}

/// Non-empty path segments of a URL.
pub fn path_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

// ============================================================================
// YouTube
// ============================================================================

/// Check if a host belongs to YouTube.
pub fn is_youtube_host(host: &str) -> bool {
    matches!(
        host,
        "youtube.com" | "www.youtube.com" | "m.youtube.com" | "youtu.be"
    )
}

/// Extract a YouTube video id from any supported spelling:
/// `/shorts/{id}`, `youtu.be/{id}`, or `watch?v={id}`.
pub fn extract_youtube_id(url: &Url) -> Option<String> {
    let host = host_of(url);
    let segments = path_segments(url);

    let candidate = if host == "youtu.be" {
        segments.first().map(|s| s.to_string())
    } else if segments.first() == Some(&"shorts") {
        segments.get(1).map(|s| s.to_string())
    } else if segments.first() == Some(&"watch") {
        url.query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.into_owned())
    } else {
        None
    }?;

    is_valid_youtube_id(&candidate).then_some(candidate)
}

/// YouTube ids are typically 11 characters of `[A-Za-z0-9_-]`. The bounds
/// are kept loose; the remote pipeline revalidates before extraction.
pub fn is_valid_youtube_id(id: &str) -> bool {
    (5..=15).contains(&id.len()) && is_shortcode_chars(id)
}

// ============================================================================
// TikTok
// ============================================================================

/// Check if a host belongs to TikTok, including the share-link hosts.
pub fn is_tiktok_host(host: &str) -> bool {
    matches!(
        host,
        "tiktok.com" | "www.tiktok.com" | "m.tiktok.com" | "vm.tiktok.com" | "vt.tiktok.com"
    )
}

/// Check if a host is one of TikTok's shortened share-link hosts.
pub fn is_tiktok_share_host(host: &str) -> bool {
    matches!(host, "vm.tiktok.com" | "vt.tiktok.com")
}

/// Extract `(handle, video_id)` from the full TikTok form
/// `/@{handle}/video/{id}`. Handles are lowercased so that spellings
/// differing only in case key the same job.
pub fn extract_tiktok_video(url: &Url) -> Option<(String, String)> {
    let segments = path_segments(url);

    let handle = segments.first()?.strip_prefix('@')?;
    if handle.is_empty() || segments.get(1) != Some(&"video") {
        return None;
    }

    let id = segments.get(2)?;
    if !is_valid_tiktok_video_id(id) {
        return None;
    }

    Some((handle.to_ascii_lowercase(), id.to_string()))
}

/// Extract a share code from `vm.tiktok.com/{code}`, `vt.tiktok.com/{code}`,
/// or `tiktok.com/t/{code}`.
pub fn extract_tiktok_share_code(url: &Url) -> Option<String> {
    let host = host_of(url);
    let segments = path_segments(url);

    let code = if is_tiktok_share_host(&host) {
        segments.first()?
    } else if segments.first() == Some(&"t") {
        segments.get(1)?
    } else {
        return None;
    };

    is_valid_share_code(code).then(|| code.to_string())
}

/// TikTok video ids are long decimal numbers.
pub fn is_valid_tiktok_video_id(id: &str) -> bool {
    (1..=25).contains(&id.len()) && id.chars().all(|c| c.is_ascii_digit())
}

// ============================================================================
// Instagram
// ============================================================================

/// Check if a host belongs to Instagram.
pub fn is_instagram_host(host: &str) -> bool {
    matches!(
        host,
        "instagram.com" | "www.instagram.com" | "m.instagram.com" | "instagr.am"
    )
}

/// Extract a reel shortcode from `/reel/{code}`, `/reels/{code}`, or
/// `/p/{code}` spellings.
pub fn extract_instagram_reel_code(url: &Url) -> Option<String> {
    let segments = path_segments(url);

    let code = match segments.first() {
        Some(&"reel") | Some(&"reels") | Some(&"p") => segments.get(1)?,
        _ => return None,
    };

    is_valid_share_code(code).then(|| code.to_string())
}

// ============================================================================
// Shared validation
// ============================================================================

/// Check if a string contains only URL-safe shortcode characters.
fn is_shortcode_chars(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Share codes (TikTok share links, Instagram shortcodes) are short
/// alphanumeric tokens.
pub fn is_valid_share_code(code: &str) -> bool {
    (4..=20).contains(&code.len()) && is_shortcode_chars(code)
}
