//! Raw-transfer strategy: yt-dlp's built-in downloader or aria2c.

use std::path::{Path, PathBuf};

use crate::config::{AcceleratorConfig, AcceleratorMode};

/// How yt-dlp moves bytes for one item. Chosen once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transferer {
    Builtin,
    /// Multi-connection transfer through an external downloader.
    External {
        program: PathBuf,
        connections: u32,
        min_split_size: String,
    },
}

impl Transferer {
    /// Picks the strategy from config, probing PATH for aria2c.
    pub fn select(cfg: &AcceleratorConfig) -> Self {
        Self::select_with(cfg, |name| which::which(name).ok())
    }

    /// Like `select` with an injectable PATH probe.
    pub fn select_with(
        cfg: &AcceleratorConfig,
        probe: impl FnOnce(&str) -> Option<PathBuf>,
    ) -> Self {
        if cfg.mode == AcceleratorMode::Off {
            return Transferer::Builtin;
        }
        match probe("aria2c") {
            Some(program) => {
                tracing::info!(program = %program.display(), "using aria2c for transfers");
                Transferer::External {
                    program,
                    connections: cfg.connections.clamp(1, 16),
                    min_split_size: cfg.min_split_size.clone(),
                }
            }
            None => {
                if cfg.mode == AcceleratorMode::Aria2c {
                    tracing::warn!("aria2c requested but not found on PATH, using built-in downloader");
                } else {
                    tracing::debug!("aria2c not found, using built-in downloader");
                }
                Transferer::Builtin
            }
        }
    }

    /// Extra yt-dlp arguments selecting this strategy.
    pub fn downloader_args(&self) -> Vec<String> {
        match self {
            Transferer::Builtin => Vec::new(),
            Transferer::External {
                program,
                connections,
                min_split_size,
            } => vec![
                "--downloader".to_string(),
                program_arg(program),
                "--downloader-args".to_string(),
                format!("aria2c:-x {connections} -s {connections} -k {min_split_size}"),
            ],
        }
    }
}

fn program_arg(program: &Path) -> String {
    program.to_string_lossy().into_owned()
}
