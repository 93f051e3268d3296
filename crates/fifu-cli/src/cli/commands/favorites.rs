//! `fifu favorites` / `fifu favorite` – favorite channels.

use anyhow::Result;
use fifu_core::catalog::channel_url;

use crate::cli::prefs::{prefs_path, FavoriteChannel, Prefs};

pub fn run_favorites() -> Result<()> {
    let prefs = Prefs::load_from(&prefs_path()?);
    if prefs.favorites.is_empty() {
        println!("No favorite channels.");
    }
    for f in &prefs.favorites {
        println!("{:<30} {:<26} {}", f.name, f.id, f.url);
    }
    Ok(())
}

pub fn run_favorite(channel_id: &str, name: Option<&str>) -> Result<()> {
    let path = prefs_path()?;
    let mut prefs = Prefs::load_from(&path);
    let id = channel_id.trim().to_string();
    let channel = FavoriteChannel {
        name: name.unwrap_or(&id).to_string(),
        url: format!("{}/videos", channel_url(&id)),
        id,
    };
    let name = channel.name.clone();
    if prefs.toggle_favorite(channel) {
        println!("Added {name} to favorites.");
    } else {
        println!("Removed {name} from favorites.");
    }
    prefs.save_to(&path)?;
    Ok(())
}
