//! Tab-separated creator roster.
//!
//! Layout, one creator per block:
//!
//! ```text
//! John Sellers<TAB>Contact account<TAB>johnstudiesnothing<TAB>https://www.instagram.com/johnstudiesnothing
//! <TAB>Mathos TT<TAB>integratingjohn<TAB>https://www.tiktok.com/@integratingjohn?_r=1
//! <TAB>Mathos YT<TAB>JNS426<TAB>https://www.youtube.com/@JNS426/shorts
//! ```
//!
//! A line that does not start with a tab opens a new creator; the first
//! account may sit on the same line. Indented lines are accounts:
//! `label, handle, url`, any of which may be blank.
//!
//! The handle embedded in an account URL is always registered. The handle
//! column is registered only for platform-labelled rows (`... TT`,
//! `... Ins`, `... YT`) whose URL, if any, points at that same platform.

use crate::{
    error::{PayoutError, PayoutResult},
    normalize::{handle_from_url, is_handle_token, normalize_handle, platform_from_url},
    registry::{CreatorRecord, CreatorRegistry},
    types::Platform,
};

/// Parse a roster into creator records, in file order.
pub fn parse_roster(text: &str) -> PayoutResult<Vec<CreatorRecord>> {
    let mut creators: Vec<CreatorRecord> = Vec::new();

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        let fields: Vec<&str> = line
            .split('\t')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .collect();
        if fields.is_empty() {
            continue;
        }

        if line.starts_with('\t') {
            let Some(current) = creators.last_mut() else {
                return Err(PayoutError::Roster {
                    line:   line_no,
                    reason: "account line before any creator".into(),
                });
            };
            add_account(current, &fields);
        } else {
            let name = fields[0];
            if name.starts_with("http") {
                return Err(PayoutError::Roster {
                    line:   line_no,
                    reason: format!("expected a creator name, found URL {name}"),
                });
            }
            let mut creator = CreatorRecord::new(creator_slug(name), clean_display_name(name));
            if fields.len() > 1 {
                add_account(&mut creator, &fields[1..]);
            }
            creators.push(creator);
        }
    }

    log::debug!("roster: parsed {} creator(s)", creators.len());
    Ok(creators)
}

/// Parse and freeze. Handle collisions surface here, before any matching.
pub fn load_roster(text: &str) -> PayoutResult<CreatorRegistry> {
    CreatorRegistry::from_records(parse_roster(text)?)
}

fn add_account(creator: &mut CreatorRecord, fields: &[&str]) {
    let label = fields.first().copied().unwrap_or_default();
    let mut handle = fields.get(1).copied().unwrap_or_default();
    let mut url = fields.get(2).copied().unwrap_or_default();
    if url.is_empty() && handle.starts_with("http") {
        url = handle;
        handle = "";
    }

    // Contact rows hold placeholders ("Instagram", "Google Form") in the
    // handle column; only platform rows whose URL agrees are trusted.
    let url_platform = platform_from_url(url);
    if let Some(platform) = platform_from_label(label) {
        let normalized = normalize_handle(handle);
        let agrees = url_platform.map_or(true, |p| p == platform);
        if agrees && is_handle_token(&normalized) {
            creator.add_handle(platform, &normalized);
        }
    }
    if let Some((url_platform, url_handle)) = handle_from_url(url) {
        creator.add_handle(url_platform, &url_handle);
    }
}

/// Platform implied by an account label such as `Mathos TT` or `Instagram`.
fn platform_from_label(label: &str) -> Option<Platform> {
    let last = label.split_whitespace().last()?.to_lowercase();
    match last.as_str() {
        "ins" | "ig" | "insta" | "instagram" => Some(Platform::Instagram),
        "tt" | "tiktok"                      => Some(Platform::Tiktok),
        "yt" | "youtube"                     => Some(Platform::Youtube),
        _ => None,
    }
}

/// Roster names carry status markers (`Nevin+`, `Arnab*`) that exports do not.
fn clean_display_name(name: &str) -> String {
    name.trim().trim_end_matches(&['+', '*'][..]).trim().to_string()
}

fn creator_slug(name: &str) -> String {
    let mut slug = String::new();
    for ch in clean_display_name(name).to_lowercase().chars() {
        if ch.is_alphanumeric() {
            slug.push(ch);
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_and_names_drop_markers() {
        assert_eq!(creator_slug("Kevin Rhee"), "kevin-rhee");
        assert_eq!(creator_slug("Nevin+"), "nevin");
        assert_eq!(clean_display_name("Arnab* "), "Arnab");
        assert_eq!(clean_display_name("Huzaifa "), "Huzaifa");
    }

    #[test]
    fn labels_imply_platforms() {
        assert_eq!(platform_from_label("Mathos Ins"), Some(Platform::Instagram));
        assert_eq!(platform_from_label("Mathos TT"), Some(Platform::Tiktok));
        assert_eq!(platform_from_label("Mathos YT"), Some(Platform::Youtube));
        assert_eq!(platform_from_label("Contact account"), None);
    }
}
