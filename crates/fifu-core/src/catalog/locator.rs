//! Classification and normalization of source locators.

use url::Url;

use crate::error::CatalogError;

const YOUTUBE: &str = "https://www.youtube.com";

/// Channel tabs that are already a listing and must not get `/videos` appended.
const CHANNEL_TABS: &[&str] = &["videos", "shorts", "streams", "playlists", "featured"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorKind {
    Channel,
    Playlist,
    Video,
    /// A URL on a site we do not know; yt-dlp decides what it is.
    Other,
}

pub fn channel_url(channel_id: &str) -> String {
    format!("{YOUTUBE}/channel/{channel_id}")
}

pub fn channel_playlists_url(channel_id: &str) -> String {
    format!("{YOUTUBE}/channel/{channel_id}/playlists")
}

pub fn video_url(video_id: &str) -> String {
    format!("{YOUTUBE}/watch?v={video_id}")
}

pub fn playlist_url(playlist_id: &str) -> String {
    format!("{YOUTUBE}/playlist?list={playlist_id}")
}

fn is_youtube_host(host: &str) -> bool {
    matches!(
        host,
        "youtube.com" | "www.youtube.com" | "m.youtube.com" | "music.youtube.com" | "youtu.be"
    )
}

fn looks_like_channel_id(s: &str) -> bool {
    s.len() == 24 && s.starts_with("UC") && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Turns user input into a URL: bare channel ids and `@handles` become
/// YouTube channel URLs, scheme-less YouTube URLs get `https://`.
pub fn normalize_source(input: &str) -> Result<String, CatalogError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CatalogError::Locator("empty locator".to_string()));
    }
    if looks_like_channel_id(input) {
        return Ok(channel_url(input));
    }
    if let Some(handle) = input.strip_prefix('@') {
        if !handle.is_empty() && !handle.contains('/') {
            return Ok(format!("{YOUTUBE}/@{handle}"));
        }
    }
    let candidate = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{input}")
    };
    let url = Url::parse(&candidate)
        .map_err(|e| CatalogError::Locator(format!("{input}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(CatalogError::Locator(format!("unsupported scheme {other}: {input}"))),
    }
}

/// Decides what a (normalized) URL points at.
pub fn classify(locator: &str) -> LocatorKind {
    let Ok(url) = Url::parse(locator) else {
        return LocatorKind::Other;
    };
    let Some(host) = url.host_str() else {
        return LocatorKind::Other;
    };
    if !is_youtube_host(host) {
        return LocatorKind::Other;
    }
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();
    if host == "youtu.be" {
        return if segments.is_empty() {
            LocatorKind::Other
        } else {
            LocatorKind::Video
        };
    }
    let has_query = |key: &str| url.query_pairs().any(|(k, v)| k == key && !v.is_empty());
    match segments.first().copied() {
        Some("watch") if has_query("v") => LocatorKind::Video,
        Some("shorts") | Some("live") | Some("embed") if segments.len() > 1 => LocatorKind::Video,
        Some("playlist") if has_query("list") => LocatorKind::Playlist,
        Some("channel") | Some("c") | Some("user") if segments.len() > 1 => LocatorKind::Channel,
        Some(seg) if seg.starts_with('@') => LocatorKind::Channel,
        _ => LocatorKind::Other,
    }
}

/// URL of the channel's video listing (appends `/videos` unless a tab is given).
pub fn channel_videos_url(locator: &str) -> Result<String, CatalogError> {
    let normalized = normalize_source(locator)?;
    let mut url = Url::parse(&normalized)
        .map_err(|e| CatalogError::Locator(format!("{locator}: {e}")))?;
    let last = url
        .path_segments()
        .and_then(|s| s.filter(|seg| !seg.is_empty()).last().map(str::to_string));
    if let Some(last) = last {
        if CHANNEL_TABS.contains(&last.as_str()) {
            return Ok(url.to_string());
        }
    }
    let path = format!("{}/videos", url.path().trim_end_matches('/'));
    url.set_path(&path);
    Ok(url.to_string())
}
