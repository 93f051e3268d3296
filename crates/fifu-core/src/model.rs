//! Data model shared by the scheduler, executor and progress sink.

use std::path::PathBuf;

/// Percent reported while downloading when the total size is unknown.
/// Distinguishes "size unknown" from "not started" (0.0).
pub const UNKNOWN_PERCENT: f64 = 0.1;

/// Default number of items fetched concurrently.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// One downloadable unit from the catalog. Immutable once enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub title: String,
    /// Source URL handed to the retrieval tool.
    pub locator: String,
    /// Duration in seconds, when the catalog knows it.
    pub duration: Option<u64>,
    /// OR-ed with `RunOptions::subtitles`.
    pub wants_subtitles: bool,
    /// Per-item quality; empty means "use the run's quality".
    pub quality_spec: String,
}

impl Item {
    pub fn new(id: impl Into<String>, title: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            locator: locator.into(),
            duration: None,
            wants_subtitles: false,
            quality_spec: String::new(),
        }
    }

    pub fn with_duration(mut self, duration: Option<u64>) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_subtitles(mut self, wants: bool) -> Self {
        self.wants_subtitles = wants;
        self
    }

    pub fn with_quality(mut self, quality_spec: impl Into<String>) -> Self {
        self.quality_spec = quality_spec.into();
        self
    }
}

/// Options fixed for the duration of one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub concurrency_limit: usize,
    pub quality_spec: String,
    pub subtitles: bool,
    /// Directory that receives every file of this run.
    pub destination_dir: PathBuf,
}

impl RunOptions {
    pub fn new(destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY,
            quality_spec: "best".to_string(),
            subtitles: false,
            destination_dir: destination_dir.into(),
        }
    }

    /// Quality expression in effect for `item`.
    pub fn quality_for<'a>(&'a self, item: &'a Item) -> &'a str {
        if item.quality_spec.trim().is_empty() {
            &self.quality_spec
        } else {
            &item.quality_spec
        }
    }

    pub fn subtitles_for(&self, item: &Item) -> bool {
        self.subtitles || item.wants_subtitles
    }
}

/// Lifecycle of one scheduled item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Pending,
    Starting,
    Downloading,
    Finishing,
    Completed,
    Failed,
    Skipped,
    Stopped,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Skipped | JobStatus::Stopped
        )
    }

    /// Holds a pool slot.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            JobStatus::Starting | JobStatus::Downloading | JobStatus::Finishing
        )
    }

    /// Position in the phase order; terminal states share the last rank.
    fn rank(self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Starting => 1,
            JobStatus::Downloading => 2,
            JobStatus::Finishing => 3,
            _ => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Starting => "starting",
            JobStatus::Downloading => "downloading",
            JobStatus::Finishing => "finishing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Skipped => "skipped",
            JobStatus::Stopped => "stopped",
        }
    }
}

/// Mutable progress record for one item, owned by that item's executor.
///
/// Byte counts and percent cover every file yt-dlp fetches for the item
/// (subtitles, then the video stream, then the audio stream), not just the
/// file currently in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct JobState {
    pub status: JobStatus,
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
    /// Bytes per second.
    pub speed: Option<f64>,
    /// Seconds remaining.
    pub eta: Option<u64>,
    pub percent: f64,
    streams: StreamTally,
}

/// Per-file byte accounting behind `JobState::record_bytes`.
#[derive(Debug, Clone, PartialEq)]
struct StreamTally {
    /// Media streams the format selects (2 for `video+audio`).
    expected: usize,
    media_started: usize,
    /// Bytes of files that are already done.
    finished_bytes: u64,
    current: Option<StreamSample>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct StreamSample {
    downloaded: u64,
    total: Option<u64>,
    media: bool,
}

impl StreamSample {
    fn is_complete(&self) -> bool {
        matches!(self.total, Some(t) if self.downloaded >= t)
    }
}

impl Default for StreamTally {
    fn default() -> Self {
        Self {
            expected: 1,
            media_started: 0,
            finished_bytes: 0,
            current: None,
        }
    }
}

impl StreamTally {
    /// Folds a sample in. Returns the current stream after the update.
    ///
    /// A new file starts when the total changes or when the count drops after
    /// the previous file completed. A file whose first sample is already
    /// complete is auxiliary (subtitles, thumbnail): it adds bytes but never
    /// moves the bar.
    fn observe(&mut self, downloaded: u64, total: Option<u64>) -> StreamSample {
        let next = match self.current {
            Some(cur)
                if cur.total == total && (downloaded >= cur.downloaded || !cur.is_complete()) =>
            {
                StreamSample { downloaded, ..cur }
            }
            previous => {
                if let Some(prev) = previous {
                    self.finished_bytes += prev.total.unwrap_or(prev.downloaded).max(prev.downloaded);
                }
                let media = !matches!(total, Some(t) if downloaded >= t);
                if media {
                    self.media_started += 1;
                }
                StreamSample {
                    downloaded,
                    total,
                    media,
                }
            }
        };
        self.current = Some(next);
        next
    }

    /// Share of the item covered by the media streams started so far. Until
    /// the last expected stream starts, its size is unknown, so earlier
    /// streams are scaled into their slot.
    fn scale(&self) -> f64 {
        if self.media_started >= self.expected {
            1.0
        } else {
            self.media_started as f64 / self.expected as f64
        }
    }
}

impl Default for JobState {
    fn default() -> Self {
        Self {
            status: JobStatus::Pending,
            downloaded_bytes: 0,
            total_bytes: None,
            speed: None,
            eta: None,
            percent: 0.0,
            streams: StreamTally::default(),
        }
    }
}

impl JobState {
    /// State for an item whose format fetches `media_streams` separate files
    /// that are merged afterwards.
    pub fn with_media_streams(media_streams: usize) -> Self {
        let mut state = Self::default();
        state.streams.expected = media_streams.max(1);
        state
    }

    /// Moves to `status`. Returns false (and changes nothing) for backwards
    /// moves or moves out of a terminal state.
    pub fn advance(&mut self, status: JobStatus) -> bool {
        if self.status.is_terminal() || status.rank() < self.status.rank() {
            return false;
        }
        if status != self.status {
            self.status = status;
            self.percent = match status {
                JobStatus::Finishing | JobStatus::Completed => 100.0,
                _ => 0.0,
            };
        }
        true
    }

    /// Records a byte-count sample of the file in flight. Percent never
    /// decreases within the phase; an unknown total yields `UNKNOWN_PERCENT`.
    pub fn record_bytes(
        &mut self,
        downloaded: u64,
        total: Option<u64>,
        speed: Option<f64>,
        eta: Option<u64>,
    ) {
        let total = total.filter(|t| *t > 0);
        let sample = self.streams.observe(downloaded, total);
        let base = self.streams.finished_bytes;
        self.downloaded_bytes = base + downloaded;
        self.total_bytes = total.map(|t| base + t);
        self.speed = speed;
        self.eta = eta;
        let percent = match self.total_bytes {
            None => UNKNOWN_PERCENT,
            Some(_) if !sample.media => self.percent,
            Some(t) => {
                let fraction = (self.downloaded_bytes as f64 / t as f64).clamp(0.0, 1.0);
                fraction * self.streams.scale() * 100.0
            }
        };
        self.percent = self.percent.max(percent);
    }

    pub fn snapshot(&self, title: &str) -> DownloadProgress {
        DownloadProgress {
            title: title.to_string(),
            status: self.status,
            downloaded_bytes: self.downloaded_bytes,
            total_bytes: self.total_bytes,
            speed: self.speed,
            eta: self.eta,
            percent: self.percent,
        }
    }
}

/// Immutable progress snapshot published by an executor.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProgress {
    pub title: String,
    pub status: JobStatus,
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
    pub speed: Option<f64>,
    pub eta: Option<u64>,
    pub percent: f64,
}

/// Terminal result for one item.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub status: JobStatus,
    pub title: String,
    pub file_path: Option<PathBuf>,
    pub error: Option<String>,
}

impl Outcome {
    pub fn completed(title: impl Into<String>, file_path: Option<PathBuf>) -> Self {
        Self {
            status: JobStatus::Completed,
            title: title.into(),
            file_path,
            error: None,
        }
    }

    pub fn failed(title: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            status: JobStatus::Failed,
            title: title.into(),
            file_path: None,
            error: Some(if error.trim().is_empty() {
                "unknown error".to_string()
            } else {
                error
            }),
        }
    }

    pub fn stopped(title: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Stopped,
            title: title.into(),
            file_path: None,
            error: None,
        }
    }

    pub fn skipped(title: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Skipped,
            title: title.into(),
            file_path: None,
            error: None,
        }
    }
}

/// Aggregate counters for one run, owned by the dispatch loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunState {
    pub total_items: usize,
    pub completed_count: usize,
    pub failed_count: usize,
    pub skipped_count: usize,
    pub stopped_count: usize,
    pub stop_requested: bool,
}

impl RunState {
    pub fn new(total_items: usize) -> Self {
        Self {
            total_items,
            ..Self::default()
        }
    }

    pub fn finished_count(&self) -> usize {
        self.completed_count + self.failed_count + self.skipped_count + self.stopped_count
    }

    pub fn is_terminal(&self) -> bool {
        self.finished_count() == self.total_items
    }

    /// Counts one terminal status. Non-terminal statuses are ignored.
    pub fn record(&mut self, status: JobStatus) {
        match status {
            JobStatus::Completed => self.completed_count += 1,
            JobStatus::Failed => self.failed_count += 1,
            JobStatus::Skipped => self.skipped_count += 1,
            JobStatus::Stopped => self.stopped_count += 1,
            _ => {}
        }
    }
}

/// Result of a finished run: counters plus one outcome per input item, in input order.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub state: RunState,
    pub outcomes: Vec<Outcome>,
}
