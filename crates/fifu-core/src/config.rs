use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::model::DEFAULT_CONCURRENCY;

/// When to hand raw transfers to an external multi-connection downloader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceleratorMode {
    /// Use aria2c if it is found on PATH.
    #[default]
    Auto,
    /// Always use yt-dlp's built-in downloader.
    Off,
    /// Require aria2c; falls back to built-in with a warning if missing.
    Aria2c,
}

/// External accelerator parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceleratorConfig {
    #[serde(default)]
    pub mode: AcceleratorMode,
    /// Connections per item (aria2c `-x` / `-s`).
    pub connections: u32,
    /// Minimum split size (aria2c `-k`, e.g. "1M").
    pub min_split_size: String,
}

impl Default for AcceleratorConfig {
    fn default() -> Self {
        Self {
            mode: AcceleratorMode::Auto,
            connections: 4,
            min_split_size: "1M".to_string(),
        }
    }
}

/// Global configuration loaded from `~/.config/fifu/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FifuConfig {
    /// Maximum number of items downloading at once.
    pub concurrency_limit: usize,
    /// Default quality: a preset name (best, 1080p, 720p, 480p, audio) or a format expression.
    pub quality: String,
    /// Fetch and embed subtitles by default.
    pub subtitles: bool,
    /// Root for per-source download directories (None = ~/Downloads/videos).
    #[serde(default)]
    pub download_root: Option<PathBuf>,
    /// How long a finished item stays in the active view.
    pub grace_period_ms: u64,
    /// Minimum interval between progress redraws.
    pub render_interval_ms: u64,
    /// Explicit yt-dlp binary (None = search PATH).
    #[serde(default)]
    pub yt_dlp_path: Option<PathBuf>,
    /// Extra arguments placed before all others on every yt-dlp invocation.
    #[serde(default)]
    pub yt_dlp_args: Vec<String>,
    #[serde(default)]
    pub accelerator: AcceleratorConfig,
}

impl Default for FifuConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY,
            quality: "best".to_string(),
            subtitles: false,
            download_root: None,
            grace_period_ms: 2000,
            render_interval_ms: 100,
            yt_dlp_path: None,
            yt_dlp_args: Vec::new(),
            accelerator: AcceleratorConfig::default(),
        }
    }
}

impl FifuConfig {
    /// Download root, defaulting to `$HOME/Downloads/videos` (or `./videos` without HOME).
    pub fn download_root(&self) -> PathBuf {
        if let Some(root) = &self.download_root {
            return root.clone();
        }
        match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join("Downloads").join("videos"),
            None => PathBuf::from("videos"),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fifu")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FifuConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FifuConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: FifuConfig = toml::from_str(&data)?;
    Ok(cfg)
}
