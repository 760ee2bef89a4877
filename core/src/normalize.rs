//! Canonical forms for handles, URLs, captions, names and dates.
//!
//! RULE: every comparison the registry or the deduplicator makes goes
//! through one of these functions. Nothing compares raw export strings.

use crate::types::Platform;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Instagram routes that occupy the first path segment but are not accounts.
const INSTAGRAM_RESERVED: &[&str] = &[
    "reel", "reels", "p", "tv", "stories", "explore", "accounts", "direct", "share",
];

/// Lowercase, trim, and drop any leading `@`.
pub fn normalize_handle(handle: &str) -> String {
    handle.trim().trim_start_matches('@').trim().to_lowercase()
}

/// Strip query string, fragment and trailing slashes; lowercase.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    let end = url.find(|c: char| c == '?' || c == '#').unwrap_or(url.len());
    url[..end].trim_end_matches('/').to_lowercase()
}

/// Lowercase and collapse all whitespace runs to a single space.
/// A missing caption normalizes to the empty string.
pub fn normalize_caption(caption: Option<&str>) -> String {
    caption
        .map(|c| c.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
        .unwrap_or_default()
}

/// Display names compare exactly like captions: case and spacing are noise.
pub fn normalize_display_name(name: &str) -> String {
    normalize_caption(Some(name))
}

/// Reduce a date or datetime string to its calendar day.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS[+tz]`, RFC 3339 and
/// `MM/DD/YYYY`. Returns `None` for empty or unrecognized input.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    if let Some(prefix) = raw.get(..10) {
        if let Ok(day) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(day);
        }
    }
    NaiveDate::parse_from_str(raw, "%m/%d/%Y").ok()
}

/// Host and non-empty path segments of a normalized URL.
fn split_url(url: &str) -> Option<(String, Vec<String>)> {
    let normalized = normalize_url(url);
    let rest = match normalized.find("://") {
        Some(i) => &normalized[i + 3..],
        None => normalized.as_str(),
    };
    let mut parts = rest.split('/');
    let host = parts.next()?.split(':').next()?.to_string();
    if host.is_empty() {
        return None;
    }
    let segments = parts
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    Some((host, segments))
}

fn host_is(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{domain}"))
}

/// Which platform a URL points at, judged by its host.
pub fn platform_from_url(url: &str) -> Option<Platform> {
    let (host, _) = split_url(url)?;
    if host_is(&host, "instagram.com") {
        Some(Platform::Instagram)
    } else if host_is(&host, "tiktok.com") {
        Some(Platform::Tiktok)
    } else if host_is(&host, "youtube.com") || host_is(&host, "youtu.be") {
        Some(Platform::Youtube)
    } else {
        None
    }
}

/// Extract the account handle embedded in a profile or video URL.
///
/// - TikTok:    `tiktok.com/@handle[/video/<id>]`
/// - YouTube:   `youtube.com/@handle[/shorts]`
/// - Instagram: `instagram.com/handle[/...]`, skipping reserved routes
///
/// URLs that only carry a media id (`instagram.com/reel/<id>`,
/// `youtu.be/<id>`) yield `None`.
pub fn handle_from_url(url: &str) -> Option<(Platform, String)> {
    let platform = platform_from_url(url)?;
    let (_, segments) = split_url(url)?;
    let first = segments.first()?;

    let handle = match platform {
        Platform::Tiktok | Platform::Youtube => first.strip_prefix('@')?,
        Platform::Instagram => {
            if INSTAGRAM_RESERVED.contains(&first.as_str()) {
                return None;
            }
            first.trim_start_matches('@')
        }
    };

    let handle = normalize_handle(handle);
    if is_handle_token(&handle) {
        Some((platform, handle))
    } else {
        None
    }
}

/// True when `s` looks like an account handle: non-empty, no whitespace,
/// only ASCII alphanumerics, `.`, `_` and `-`.
pub fn is_handle_token(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}
