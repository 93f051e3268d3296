//! `fifu fetch` – download a channel, playlist or single video.

use anyhow::Result;
use fifu_core::config::FifuConfig;

use super::with_catalog;
use crate::cli::selection::select_items;
use crate::cli::session::run_session;
use crate::cli::FetchArgs;

pub async fn run_fetch(
    cfg: &FifuConfig,
    source: &str,
    limit: Option<usize>,
    filter: Option<&str>,
    select: Option<&str>,
    args: &FetchArgs,
) -> Result<()> {
    let locator = source.to_string();
    let resolved = with_catalog(cfg, move |catalog| catalog.resolve_source(&locator, limit)).await?;
    let options = args.run_options(cfg, resolved.directory_name());
    let items = select_items(resolved.items, filter, select)?;
    if items.is_empty() {
        println!("Nothing to fetch.");
        return Ok(());
    }

    println!(
        "Fetching {} item(s) from {} into {}",
        items.len(),
        resolved.title,
        options.destination_dir.display()
    );
    tracing::info!(source, items = items.len(), "fetch");
    run_session(cfg, items, options).await?;
    Ok(())
}
