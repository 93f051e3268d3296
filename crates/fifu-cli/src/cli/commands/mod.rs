//! CLI command handlers. Each command is in its own file.

mod favorites;
mod fetch;
mod get;
mod history;
mod list;
mod playlists;
mod search;
mod stop;

pub use favorites::{run_favorite, run_favorites};
pub use fetch::run_fetch;
pub use get::run_get;
pub use history::run_history;
pub use list::run_list;
pub use playlists::run_playlists;
pub use search::run_search;
pub use stop::run_stop;

use anyhow::{Context, Result};
use fifu_core::catalog::{Catalog, YtDlpCatalog};
use fifu_core::config::FifuConfig;

/// Runs a blocking catalog lookup off the async runtime.
async fn with_catalog<T, F>(cfg: &FifuConfig, lookup: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn Catalog) -> Result<T, fifu_core::error::CatalogError> + Send + 'static,
{
    let catalog = YtDlpCatalog::from_config(cfg);
    let result = tokio::task::spawn_blocking(move || lookup(&catalog))
        .await
        .context("catalog lookup task")?;
    Ok(result?)
}
