//! Catalog collaborator: discovers what there is to fetch.
//!
//! Channel search, a channel's playlists and source resolution (a channel,
//! playlist or video URL expanded to its title, owner and items) all go
//! through the `Catalog` trait. `YtDlpCatalog` implements it with yt-dlp's
//! flat JSON dump; the parsers are pure functions over that JSON.

mod locator;
mod ytdlp;

pub use locator::{
    channel_playlists_url, channel_url, channel_videos_url, classify, normalize_source,
    playlist_url, video_url, LocatorKind,
};
pub use ytdlp::{
    parse_channel_search, parse_playlists, parse_source, YtDlpCatalog,
};

use crate::error::CatalogError;
use crate::model::Item;

/// A channel found by search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
    /// Videos tab of the channel.
    pub url: String,
    pub subscriber_count: Option<u64>,
    /// First 100 characters of the channel description.
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistInfo {
    pub id: String,
    pub title: String,
    pub url: String,
    pub video_count: Option<u64>,
}

/// A resolved URL: what it is, who owns it and the items it expands to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub kind: LocatorKind,
    pub title: String,
    /// Channel or uploader name; empty when the site does not report one.
    pub owner: String,
    pub items: Vec<Item>,
}

impl Source {
    /// Name of the per-source download directory (before sanitization).
    pub fn directory_name(&self) -> &str {
        if self.owner.trim().is_empty() {
            &self.title
        } else {
            &self.owner
        }
    }
}

/// Read-only view of a remote media catalog. Calls block.
pub trait Catalog: Send + Sync {
    /// Channels matching `query`, one per channel id, most subscribed first.
    fn search_channels(&self, query: &str, max: usize) -> Result<Vec<ChannelInfo>, CatalogError>;

    fn channel_playlists(&self, channel_id: &str) -> Result<Vec<PlaylistInfo>, CatalogError>;

    /// Resolves a channel (URL, `@handle` or id), playlist or video URL to
    /// its title, owner and items. Channel listings are newest first.
    fn resolve_source(&self, url: &str, limit: Option<usize>) -> Result<Source, CatalogError>;
}

/// Human-readable count: `1.2M`, `3.4K`, `999`, or `N/A` when unknown.
pub fn format_count(count: Option<u64>) -> String {
    match count {
        None => "N/A".to_string(),
        Some(n) if n >= 1_000_000 => format!("{:.1}M", n as f64 / 1_000_000.0),
        Some(n) if n >= 1_000 => format!("{:.1}K", n as f64 / 1_000.0),
        Some(n) => n.to_string(),
    }
}
