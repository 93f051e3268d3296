//! Retrieval collaborator boundary.
//!
//! The executor talks to a `Retriever`; the production implementation drives
//! yt-dlp as a child process, with the raw transfer optionally delegated to
//! aria2c through the `Transferer` strategy. Tests plug in scripted retrievers.

mod parse;
mod transferer;
mod ytdlp;

pub use parse::{parse_line, ParsedLine, FILE_MARKER, POSTPROCESS_MARKER, PROGRESS_MARKER};
pub use transferer::Transferer;
pub use ytdlp::{locate_yt_dlp, YtDlpRetriever, STOP_POLL_INTERVAL};

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use crate::error::TransferError;

/// Everything the retrieval tool needs for one item.
#[derive(Debug, Clone)]
pub struct RetrievalRequest<'a> {
    pub locator: &'a str,
    /// Resolved yt-dlp format expression.
    pub format: &'a str,
    pub output_dir: &'a Path,
    /// Sanitized file stem; the tool picks the extension.
    pub output_stem: &'a str,
    /// yt-dlp output template for `output_dir/output_stem`.
    pub output_template: &'a str,
    pub subtitles: bool,
}

/// Low-level event reported while a transfer runs.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    /// Byte counts of the stream currently downloading.
    Bytes {
        downloaded: u64,
        total: Option<u64>,
        speed: Option<f64>,
        eta: Option<u64>,
    },
    /// Download done; muxing/embedding/moving in progress.
    Postprocessing,
    /// Nothing new happened during the last poll interval.
    Heartbeat,
}

/// Observer the retriever calls for every event. `Break` means stop was
/// requested: the retriever must abort and return `TransferError::Stopped`.
pub type Observer<'a> = dyn FnMut(TransferEvent) -> ControlFlow<()> + 'a;

/// Fetches (and muxes) one item into the requested output location.
pub trait Retriever: Send + Sync {
    /// Runs the transfer to completion on the calling thread. Returns the
    /// final file path when it could be determined.
    fn retrieve(
        &self,
        request: &RetrievalRequest<'_>,
        observer: &mut Observer<'_>,
    ) -> Result<Option<PathBuf>, TransferError>;
}
