//! `fifu search` – find channels by name.

use anyhow::Result;
use fifu_core::catalog::format_count;
use fifu_core::config::FifuConfig;

use super::with_catalog;
use crate::cli::prefs::{prefs_path, Prefs};

pub async fn run_search(cfg: &FifuConfig, query: &str, max: usize, record: bool) -> Result<()> {
    let path = prefs_path()?;
    let mut prefs = Prefs::load_from(&path);
    if record {
        prefs.add_history(query);
        if let Err(e) = prefs.save_to(&path) {
            tracing::warn!("could not save search history: {:#}", e);
        }
    }

    let q = query.to_string();
    let channels = with_catalog(cfg, move |catalog| catalog.search_channels(&q, max)).await?;
    if channels.is_empty() {
        println!("No channels found for \"{query}\".");
        return Ok(());
    }
    for (i, channel) in channels.iter().enumerate() {
        let star = if prefs.is_favorite(&channel.id) { " *" } else { "" };
        println!(
            "{:>2}. {}{}  ({} subscribers)",
            i + 1,
            channel.name,
            star,
            format_count(channel.subscriber_count)
        );
        println!("    id: {}  {}", channel.id, channel.url);
        if !channel.description.is_empty() {
            println!("    {}", channel.description.replace('\n', " "));
        }
    }
    Ok(())
}
