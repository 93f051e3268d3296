//! `fifu list` – show the videos a source expands to, with their positions.

use anyhow::Result;
use fifu_core::config::FifuConfig;

use super::with_catalog;
use crate::cli::selection::{filter_items, format_duration};

pub async fn run_list(
    cfg: &FifuConfig,
    source: &str,
    limit: Option<usize>,
    filter: Option<&str>,
) -> Result<()> {
    let locator = source.to_string();
    let resolved = with_catalog(cfg, move |catalog| catalog.resolve_source(&locator, limit)).await?;
    let owner = resolved.directory_name().to_string();
    let total = resolved.items.len();
    let items = filter_items(resolved.items, filter);

    println!("{} ({}): {}/{} videos", resolved.title, owner, items.len(), total);
    for (i, item) in items.iter().enumerate() {
        println!("{:>4}. [{:>8}] {}", i + 1, format_duration(item.duration), item.title);
    }
    Ok(())
}
