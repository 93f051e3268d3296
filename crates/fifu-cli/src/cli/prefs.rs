//! Preference store: search history and favorite channels (`prefs.json`).
//!
//! Presentation-layer state only; the core never reads it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Most recent searches kept.
pub const HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteChannel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefs {
    /// Most recent first, unique.
    #[serde(default)]
    pub history: Vec<String>,
    /// Most recently added first.
    #[serde(default)]
    pub favorites: Vec<FavoriteChannel>,
}

pub fn prefs_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fifu")?;
    Ok(xdg_dirs.place_config_file("prefs.json")?)
}

impl Prefs {
    /// Loads `path`; a missing or unreadable file yields empty prefs.
    pub fn load_from(path: &Path) -> Self {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), "cannot read prefs: {}", e);
                }
                return Self::default();
            }
        };
        serde_json::from_str(&data).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), "ignoring malformed prefs: {}", e);
            Self::default()
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    /// Moves `query` to the front of the history, dropping the oldest entries.
    pub fn add_history(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        self.history.retain(|q| q != query);
        self.history.insert(0, query.to_string());
        self.history.truncate(HISTORY_LIMIT);
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn is_favorite(&self, channel_id: &str) -> bool {
        self.favorites.iter().any(|f| f.id == channel_id)
    }

    /// Adds or removes the channel. Returns true if it is now a favorite.
    pub fn toggle_favorite(&mut self, channel: FavoriteChannel) -> bool {
        if self.is_favorite(&channel.id) {
            self.favorites.retain(|f| f.id != channel.id);
            false
        } else {
            self.favorites.insert(0, channel);
            true
        }
    }
}
