//! yt-dlp backed catalog (`--flat-playlist --dump-single-json`).

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::Deserialize;

use super::locator::{self, LocatorKind};
use super::{Catalog, ChannelInfo, PlaylistInfo, Source};
use crate::config::FifuConfig;
use crate::error::CatalogError;
use crate::model::Item;
use crate::retrieval::locate_yt_dlp;

/// Extra search results requested so that deduplication by channel still
/// leaves enough channels.
const SEARCH_HEADROOM: usize = 10;
const DESCRIPTION_CHARS: usize = 100;

/// Subset of yt-dlp's info dict that the catalog reads.
#[derive(Debug, Deserialize)]
struct InfoDict {
    #[serde(rename = "_type")]
    kind: Option<String>,
    id: Option<String>,
    title: Option<String>,
    url: Option<String>,
    webpage_url: Option<String>,
    duration: Option<f64>,
    channel: Option<String>,
    channel_id: Option<String>,
    uploader: Option<String>,
    description: Option<String>,
    channel_follower_count: Option<u64>,
    uploader_follower_count: Option<u64>,
    follower_count: Option<u64>,
    subscribers: Option<u64>,
    playlist_count: Option<u64>,
    #[serde(default)]
    entries: Vec<Option<InfoDict>>,
}

impl InfoDict {
    fn followers(&self) -> Option<u64> {
        self.channel_follower_count
            .or(self.uploader_follower_count)
            .or(self.follower_count)
            .or(self.subscribers)
    }

    fn owner(&self) -> Option<&str> {
        self.channel
            .as_deref()
            .or(self.uploader.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    fn entries(&self) -> impl Iterator<Item = &InfoDict> {
        self.entries.iter().flatten()
    }

    /// The entry as a downloadable video, or None without an id.
    fn to_item(&self) -> Option<Item> {
        let id = self.id.as_deref().filter(|s| !s.is_empty())?;
        let locator = self
            .webpage_url
            .as_deref()
            .or(self.url.as_deref())
            .filter(|u| u.starts_with("http://") || u.starts_with("https://"))
            .map(str::to_string)
            .unwrap_or_else(|| locator::video_url(id));
        let title = self.title.as_deref().unwrap_or("Unknown");
        Some(Item::new(id, title, locator).with_duration(self.duration.map(|d| d.max(0.0) as u64)))
    }
}

fn parse(json: &[u8]) -> Result<InfoDict, CatalogError> {
    Ok(serde_json::from_slice(json)?)
}

/// Channels from a `ytsearchN:` dump: first entry per channel id, most
/// followed first, at most `max`.
pub fn parse_channel_search(json: &[u8], max: usize) -> Result<Vec<ChannelInfo>, CatalogError> {
    let info = parse(json)?;
    let mut seen = HashSet::new();
    let mut channels: Vec<ChannelInfo> = info
        .entries()
        .filter_map(|entry| {
            let id = entry.channel_id.as_deref().filter(|s| !s.is_empty())?;
            if !seen.insert(id.to_string()) {
                return None;
            }
            Some(ChannelInfo {
                id: id.to_string(),
                name: entry.owner().unwrap_or("Unknown").to_string(),
                url: format!("{}/videos", locator::channel_url(id)),
                subscriber_count: entry.followers(),
                description: entry
                    .description
                    .as_deref()
                    .map(|d| d.chars().take(DESCRIPTION_CHARS).collect())
                    .unwrap_or_default(),
            })
        })
        .collect();
    // Stable sort keeps search rank among equal counts.
    channels.sort_by(|a, b| b.subscriber_count.unwrap_or(0).cmp(&a.subscriber_count.unwrap_or(0)));
    channels.truncate(max);
    Ok(channels)
}

pub fn parse_playlists(json: &[u8]) -> Result<Vec<PlaylistInfo>, CatalogError> {
    let info = parse(json)?;
    Ok(info
        .entries()
        .filter_map(|entry| {
            let id = entry.id.as_deref().filter(|s| !s.is_empty())?;
            Some(PlaylistInfo {
                id: id.to_string(),
                title: entry.title.clone().unwrap_or_else(|| "Unknown".to_string()),
                url: entry
                    .url
                    .clone()
                    .unwrap_or_else(|| locator::playlist_url(id)),
                video_count: entry.playlist_count,
            })
        })
        .collect())
}

/// A resolved source. `kind` comes from the URL when known, otherwise from
/// the dump's `_type`.
pub fn parse_source(json: &[u8], kind: LocatorKind) -> Result<Source, CatalogError> {
    let info = parse(json)?;
    let is_listing = match kind {
        LocatorKind::Channel | LocatorKind::Playlist => true,
        LocatorKind::Video => false,
        LocatorKind::Other => matches!(info.kind.as_deref(), Some("playlist") | Some("multi_video")),
    };
    let owner = info.owner().unwrap_or_default().to_string();
    if is_listing {
        let default_title = if kind == LocatorKind::Channel {
            "Unknown Channel"
        } else {
            "Unknown Playlist"
        };
        return Ok(Source {
            kind: if kind == LocatorKind::Other { LocatorKind::Playlist } else { kind },
            title: info.title.clone().unwrap_or_else(|| default_title.to_string()),
            owner,
            items: info.entries().filter_map(InfoDict::to_item).collect(),
        });
    }
    let item = info
        .to_item()
        .ok_or_else(|| CatalogError::Lookup("video has no id".to_string()))?;
    Ok(Source {
        kind: LocatorKind::Video,
        title: item.title.clone(),
        owner,
        items: vec![item],
    })
}

/// `Catalog` implementation that shells out to yt-dlp.
#[derive(Debug, Clone)]
pub struct YtDlpCatalog {
    program: PathBuf,
    leading_args: Vec<String>,
}

impl YtDlpCatalog {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    pub fn from_config(cfg: &FifuConfig) -> Self {
        Self::new(locate_yt_dlp(cfg.yt_dlp_path.as_deref())).with_leading_args(cfg.yt_dlp_args.clone())
    }

    pub fn with_leading_args(mut self, args: Vec<String>) -> Self {
        self.leading_args = args;
        self
    }

    /// Runs one flat JSON dump of `target` and returns stdout.
    fn dump(&self, target: &str, limit: Option<usize>) -> Result<Vec<u8>, CatalogError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .args(["--flat-playlist", "--dump-single-json", "--no-warnings"]);
        if let Some(limit) = limit {
            cmd.arg("--playlist-end").arg(limit.max(1).to_string());
        }
        cmd.arg("--").arg(target);
        tracing::debug!(program = %self.program.display(), lookup = target, ?limit, "catalog lookup");

        let output = cmd
            .stdin(Stdio::null())
            .output()
            .map_err(|source| CatalogError::Launch {
                program: self.program.display().to_string(),
                source,
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .map(|l| l.trim_start_matches("ERROR:").trim().to_string())
                .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status));
            tracing::warn!(lookup = target, "catalog lookup failed: {}", message);
            return Err(CatalogError::Lookup(message));
        }
        Ok(output.stdout)
    }
}

impl Catalog for YtDlpCatalog {
    fn search_channels(&self, query: &str, max: usize) -> Result<Vec<ChannelInfo>, CatalogError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let target = format!("ytsearch{}:{}", max + SEARCH_HEADROOM, query);
        parse_channel_search(&self.dump(&target, None)?, max)
    }

    fn channel_playlists(&self, channel_id: &str) -> Result<Vec<PlaylistInfo>, CatalogError> {
        parse_playlists(&self.dump(&locator::channel_playlists_url(channel_id.trim()), None)?)
    }

    fn resolve_source(&self, url: &str, limit: Option<usize>) -> Result<Source, CatalogError> {
        let url = locator::normalize_source(url)?;
        let kind = locator::classify(&url);
        let target = if kind == LocatorKind::Channel {
            locator::channel_videos_url(&url)?
        } else {
            url
        };
        parse_source(&self.dump(&target, limit)?, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH: &str = r#"{
        "_type": "playlist",
        "entries": [
            {"id": "v1", "channel_id": "UCsmall", "channel": "Small", "channel_follower_count": 1200,
             "description": "A small channel"},
            {"id": "v2", "channel_id": "UCbig", "uploader": "Big", "follower_count": 5000000},
            {"id": "v3", "channel_id": "UCsmall", "channel": "Small again", "channel_follower_count": 1},
            {"id": "v4", "title": "no channel id"},
            null,
            {"id": "v5", "channel_id": "UCnone", "channel": "Unknown subs"}
        ]
    }"#;

    #[test]
    fn search_dedupes_by_channel_and_sorts_by_followers() {
        let channels = parse_channel_search(SEARCH.as_bytes(), 10).unwrap();
        let ids: Vec<&str> = channels.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["UCbig", "UCsmall", "UCnone"]);
        assert_eq!(channels[0].name, "Big");
        assert_eq!(channels[0].url, "https://www.youtube.com/channel/UCbig/videos");
        assert_eq!(channels[1].name, "Small");
        assert_eq!(channels[1].description, "A small channel");
        assert_eq!(channels[2].subscriber_count, None);
    }

    #[test]
    fn search_truncates_to_max() {
        let channels = parse_channel_search(SEARCH.as_bytes(), 1).unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].id, "UCbig");
    }

    #[test]
    fn long_descriptions_are_cut_on_char_boundary() {
        let long = "é".repeat(150);
        let json = format!(
            r#"{{"entries":[{{"channel_id":"UC1","channel":"x","description":"{long}"}}]}}"#
        );
        let channels = parse_channel_search(json.as_bytes(), 5).unwrap();
        assert_eq!(channels[0].description.chars().count(), 100);
    }

    #[test]
    fn entries_become_items_with_watch_urls() {
        let json = r#"{"entries":[
            {"id":"a1","title":"First","url":"https://www.youtube.com/watch?v=a1","duration":61.5},
            {"id":"b2","url":"b2"},
            {"title":"no id"}
        ]}"#;
        let source = parse_source(json.as_bytes(), LocatorKind::Channel).unwrap();
        assert_eq!(source.title, "Unknown Channel");
        let items = source.items;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "First");
        assert_eq!(items[0].duration, Some(61));
        assert_eq!(items[1].title, "Unknown");
        assert_eq!(items[1].locator, "https://www.youtube.com/watch?v=b2");
    }

    #[test]
    fn playlists_fall_back_to_list_url() {
        let json = r#"{"entries":[
            {"id":"PL1","title":"Talks","playlist_count":12},
            {"id":"PL2","url":"https://www.youtube.com/playlist?list=PL2"}
        ]}"#;
        let playlists = parse_playlists(json.as_bytes()).unwrap();
        assert_eq!(playlists[0].url, "https://www.youtube.com/playlist?list=PL1");
        assert_eq!(playlists[0].video_count, Some(12));
        assert_eq!(playlists[1].title, "Unknown");
    }

    #[test]
    fn playlist_source_carries_owner_and_items() {
        let json = r#"{"_type":"playlist","title":"Talks","uploader":"Conf",
            "entries":[{"id":"x","title":"Keynote"}]}"#;
        let source = parse_source(json.as_bytes(), LocatorKind::Playlist).unwrap();
        assert_eq!(source.title, "Talks");
        assert_eq!(source.directory_name(), "Conf");
        assert_eq!(source.items.len(), 1);
    }

    #[test]
    fn video_source_and_unknown_site_listing() {
        let video = r#"{"id":"v","title":"Clip","channel":"Chan","webpage_url":"https://example.com/v"}"#;
        let source = parse_source(video.as_bytes(), LocatorKind::Other).unwrap();
        assert_eq!(source.kind, LocatorKind::Video);
        assert_eq!(source.items[0].locator, "https://example.com/v");
        assert_eq!(source.owner, "Chan");

        let listing = r#"{"_type":"playlist","entries":[]}"#;
        let source = parse_source(listing.as_bytes(), LocatorKind::Other).unwrap();
        assert_eq!(source.kind, LocatorKind::Playlist);
        assert_eq!(source.title, "Unknown Playlist");
        assert!(source.items.is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            parse_source(b"not json", LocatorKind::Playlist),
            Err(CatalogError::Json(_))
        ));
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let catalog = YtDlpCatalog::new("/nonexistent/fifu-yt-dlp");
        assert!(matches!(
            catalog.resolve_source("https://www.youtube.com/playlist?list=PL1", Some(5)),
            Err(CatalogError::Launch { .. })
        ));
    }
}
