//! `fifu get` – download hand-picked videos by URL.

use anyhow::Result;
use fifu_core::config::FifuConfig;
use fifu_core::model::Item;

use super::with_catalog;
use crate::cli::session::run_session;
use crate::cli::FetchArgs;

pub async fn run_get(cfg: &FifuConfig, urls: &[String], args: &FetchArgs) -> Result<()> {
    let urls = urls.to_vec();
    let sources = with_catalog(cfg, move |catalog| {
        urls.iter()
            .map(|url| catalog.resolve_source(url, None))
            .collect::<Result<Vec<_>, _>>()
    })
    .await?;

    // Files go to the first video's channel directory unless --dest is given.
    let owner = sources
        .first()
        .map(|s| s.directory_name().to_string())
        .unwrap_or_default();
    let options = args.run_options(cfg, &owner);

    let mut items: Vec<Item> = Vec::new();
    for source in sources {
        for item in source.items {
            if !items.iter().any(|seen| seen.id == item.id) {
                items.push(item);
            }
        }
    }
    if items.is_empty() {
        println!("Nothing to fetch.");
        return Ok(());
    }

    println!(
        "Fetching {} item(s) into {}",
        items.len(),
        options.destination_dir.display()
    );
    run_session(cfg, items, options).await?;
    Ok(())
}
