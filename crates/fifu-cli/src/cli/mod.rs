//! CLI for the fifu channel and playlist downloader.

mod commands;
#[cfg(unix)]
mod control_socket;
mod prefs;
mod render;
mod selection;
mod session;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use fifu_core::config::{self, FifuConfig};
use fifu_core::model::RunOptions;
use fifu_core::naming;
use std::path::PathBuf;

use commands::{
    run_favorite, run_favorites, run_fetch, run_get, run_history, run_list, run_playlists,
    run_search, run_stop,
};

/// Top-level CLI for fifu.
#[derive(Debug, Parser)]
#[command(name = "fifu")]
#[command(about = "fifu: fetch channels, playlists and videos with live progress", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Options shared by the commands that start a download run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct FetchArgs {
    /// Quality preset (best, 1080p, 720p, 480p, audio) or a yt-dlp format expression.
    #[arg(long, short = 'q')]
    pub quality: Option<String>,

    /// Download and embed English subtitles when available.
    #[arg(long)]
    pub subtitles: bool,

    /// Number of items downloaded at once.
    #[arg(long, short = 'j', value_name = "N")]
    pub jobs: Option<usize>,

    /// Destination directory (default: <download_root>/<channel name>).
    #[arg(long, value_name = "DIR")]
    pub dest: Option<PathBuf>,
}

impl FetchArgs {
    /// Run options from these flags, falling back to config values.
    pub fn run_options(&self, cfg: &FifuConfig, source_name: &str) -> RunOptions {
        let destination = self
            .dest
            .clone()
            .unwrap_or_else(|| naming::source_dir(&cfg.download_root(), source_name));
        let mut options = RunOptions::new(destination);
        options.concurrency_limit = self.jobs.unwrap_or(cfg.concurrency_limit).max(1);
        options.quality_spec = self.quality.clone().unwrap_or_else(|| cfg.quality.clone());
        options.subtitles = self.subtitles || cfg.subtitles;
        options
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Search channels by name, most subscribed first.
    Search {
        /// Search terms.
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Maximum number of channels shown.
        #[arg(long, short = 'n', default_value = "10")]
        max: usize,

        /// Do not record this search in the history.
        #[arg(long)]
        no_history: bool,
    },

    /// List the playlists of a channel.
    Playlists {
        /// Channel id (UC...).
        channel_id: String,
    },

    /// List the videos of a channel, playlist or video URL with their positions.
    List {
        /// Channel URL, @handle, channel id, playlist URL or video URL.
        source: String,

        /// Only the newest N videos.
        #[arg(long, value_name = "N")]
        limit: Option<usize>,

        /// Only videos whose title contains TEXT (case-insensitive).
        #[arg(long = "match", value_name = "TEXT")]
        filter: Option<String>,
    },

    /// Download a channel, playlist or single video.
    Fetch {
        /// Channel URL, @handle, channel id, playlist URL or video URL.
        source: String,

        /// Only the newest N videos.
        #[arg(long, value_name = "N")]
        limit: Option<usize>,

        /// Only videos whose title contains TEXT (case-insensitive).
        #[arg(long = "match", value_name = "TEXT")]
        filter: Option<String>,

        /// Positions from `fifu list` to download, e.g. "1,3,5-7".
        #[arg(long, value_name = "LIST")]
        select: Option<String>,

        #[command(flatten)]
        args: FetchArgs,
    },

    /// Download specific videos by URL.
    Get {
        /// Video URLs.
        #[arg(required = true, num_args = 1..)]
        urls: Vec<String>,

        #[command(flatten)]
        args: FetchArgs,
    },

    /// Stop the download run in progress (from another terminal).
    Stop,

    /// Show or clear the search history.
    History {
        #[arg(long)]
        clear: bool,
    },

    /// Show favorite channels.
    Favorites,

    /// Add a channel to favorites, or remove it if already there.
    Favorite {
        /// Channel id (UC...).
        channel_id: String,

        /// Display name stored with the favorite.
        #[arg(long)]
        name: Option<String>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Search {
                query,
                max,
                no_history,
            } => run_search(&cfg, &query.join(" "), max, !no_history).await?,
            CliCommand::Playlists { channel_id } => run_playlists(&cfg, &channel_id).await?,
            CliCommand::List {
                source,
                limit,
                filter,
            } => run_list(&cfg, &source, limit, filter.as_deref()).await?,
            CliCommand::Fetch {
                source,
                limit,
                filter,
                select,
                args,
            } => {
                run_fetch(&cfg, &source, limit, filter.as_deref(), select.as_deref(), &args).await?
            }
            CliCommand::Get { urls, args } => run_get(&cfg, &urls, &args).await?,
            CliCommand::Stop => run_stop().await?,
            CliCommand::History { clear } => run_history(clear)?,
            CliCommand::Favorites => run_favorites()?,
            CliCommand::Favorite { channel_id, name } => run_favorite(&channel_id, name.as_deref())?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
