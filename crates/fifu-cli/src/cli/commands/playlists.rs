//! `fifu playlists` – list a channel's playlists.

use anyhow::Result;
use fifu_core::config::FifuConfig;

use super::with_catalog;

pub async fn run_playlists(cfg: &FifuConfig, channel_id: &str) -> Result<()> {
    let id = channel_id.to_string();
    let playlists = with_catalog(cfg, move |catalog| catalog.channel_playlists(&id)).await?;
    if playlists.is_empty() {
        println!("No playlists found.");
        return Ok(());
    }
    println!("{:<4} {:<8} {:<50} {}", "#", "VIDEOS", "TITLE", "URL");
    for (i, p) in playlists.iter().enumerate() {
        let count = p
            .video_count
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<4} {:<8} {:<50} {}", i + 1, count, p.title, p.url);
    }
    Ok(())
}
