//! Error types shared by the retrieval, catalog and scheduling layers.

use std::path::PathBuf;
use thiserror::Error;

/// Error returned by a single item transfer.
///
/// The executor turns every variant except `Stopped` into a `Failed` outcome;
/// `Subtitles` additionally triggers one retry without subtitles.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Network or extraction failure reported by the retrieval tool.
    #[error("{0}")]
    Failed(String),
    /// Only the subtitle track could not be fetched or embedded.
    #[error("subtitle download failed: {0}")]
    Subtitles(String),
    /// The transfer noticed a stop request and aborted.
    #[error("stopped by user")]
    Stopped,
    /// The retrieval tool could not be started at all.
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Run-level failure. Only setup problems abort a whole run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("cannot create destination directory {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error from a catalog lookup (search, channel listing, URL resolution).
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog lookup failed: {0}")]
    Lookup(String),
    #[error("unexpected catalog response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported source locator: {0}")]
    Locator(String),
}
