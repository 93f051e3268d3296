//! Fetch executor: runs one item through the retriever and reports progress.
//!
//! Runs on a blocking thread. Owns the item's `JobState`; everything it
//! publishes is a snapshot.

use std::ops::ControlFlow;
use std::path::PathBuf;

use crate::error::TransferError;
use crate::model::{DownloadProgress, Item, JobState, JobStatus, Outcome, RunOptions};
use crate::naming;
use crate::quality;
use crate::retrieval::{RetrievalRequest, Retriever, TransferEvent};

/// Fetches `item` and returns its terminal outcome.
///
/// `should_stop` is consulted before every progress emission and on each
/// retriever heartbeat; once it returns true the transfer is aborted and the
/// outcome is `Stopped`. Retrieval errors never escape: they become `Failed`.
pub fn execute(
    item: &Item,
    options: &RunOptions,
    retriever: &dyn Retriever,
    on_progress: &mut dyn FnMut(DownloadProgress),
    should_stop: &dyn Fn() -> bool,
) -> Outcome {
    if should_stop() {
        return Outcome::stopped(&item.title);
    }

    let format = quality::resolve_format(options.quality_for(item));
    let stem = naming::output_stem(&item.title);
    let template = naming::output_template(&options.destination_dir, &item.title);
    let subtitles = options.subtitles_for(item);

    let mut state = JobState::with_media_streams(quality::media_streams(&format));
    state.advance(JobStatus::Starting);
    on_progress(state.snapshot(&item.title));

    let mut request = RetrievalRequest {
        locator: &item.locator,
        format: &format,
        output_dir: &options.destination_dir,
        output_stem: &stem,
        output_template: &template,
        subtitles,
    };
    tracing::debug!(title = %item.title, format = %format, subtitles, "fetch started");

    let mut result = attempt(item, &request, retriever, &mut state, on_progress, should_stop);
    if let Err(TransferError::Subtitles(msg)) = &result {
        tracing::warn!(title = %item.title, "subtitles unavailable, retrying without: {}", msg);
        request.subtitles = false;
        result = attempt(item, &request, retriever, &mut state, on_progress, should_stop);
    }

    finish(item, &mut state, result, on_progress)
}

fn attempt(
    item: &Item,
    request: &RetrievalRequest<'_>,
    retriever: &dyn Retriever,
    state: &mut JobState,
    on_progress: &mut dyn FnMut(DownloadProgress),
    should_stop: &dyn Fn() -> bool,
) -> Result<Option<PathBuf>, TransferError> {
    let mut observer = |event: TransferEvent| -> ControlFlow<()> {
        if should_stop() {
            return ControlFlow::Break(());
        }
        match event {
            TransferEvent::Bytes {
                downloaded,
                total,
                speed,
                eta,
            } => {
                // Bytes arriving after post-processing began (a retry) stay in Finishing.
                if state.advance(JobStatus::Downloading) {
                    state.record_bytes(downloaded, total, speed, eta);
                    on_progress(state.snapshot(&item.title));
                }
            }
            TransferEvent::Postprocessing => {
                if state.status != JobStatus::Finishing && state.advance(JobStatus::Finishing) {
                    on_progress(state.snapshot(&item.title));
                }
            }
            TransferEvent::Heartbeat => {}
        }
        ControlFlow::Continue(())
    };
    retriever.retrieve(request, &mut observer)
}

fn finish(
    item: &Item,
    state: &mut JobState,
    result: Result<Option<PathBuf>, TransferError>,
    on_progress: &mut dyn FnMut(DownloadProgress),
) -> Outcome {
    match result {
        Ok(path) => {
            if state.status != JobStatus::Finishing && state.advance(JobStatus::Finishing) {
                on_progress(state.snapshot(&item.title));
            }
            state.advance(JobStatus::Completed);
            Outcome::completed(&item.title, path)
        }
        Err(TransferError::Stopped) => {
            state.advance(JobStatus::Stopped);
            Outcome::stopped(&item.title)
        }
        Err(e) => {
            state.advance(JobStatus::Failed);
            Outcome::failed(&item.title, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::Observer;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays a fixed event list, then returns the scripted results in turn.
    struct Scripted {
        events: Vec<TransferEvent>,
        results: Mutex<Vec<Result<Option<PathBuf>, TransferError>>>,
        calls: AtomicUsize,
        subtitles_seen: Mutex<Vec<bool>>,
    }

    impl Scripted {
        fn new(
            events: Vec<TransferEvent>,
            results: Vec<Result<Option<PathBuf>, TransferError>>,
        ) -> Self {
            Self {
                events,
                results: Mutex::new(results),
                calls: AtomicUsize::new(0),
                subtitles_seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Retriever for Scripted {
        fn retrieve(
            &self,
            request: &RetrievalRequest<'_>,
            observer: &mut Observer<'_>,
        ) -> Result<Option<PathBuf>, TransferError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.subtitles_seen.lock().unwrap().push(request.subtitles);
            for event in self.events.clone() {
                if observer(event).is_break() {
                    return Err(TransferError::Stopped);
                }
            }
            self.results.lock().unwrap().remove(0)
        }
    }

    fn bytes(downloaded: u64, total: Option<u64>) -> TransferEvent {
        TransferEvent::Bytes {
            downloaded,
            total,
            speed: Some(1.0),
            eta: Some(1),
        }
    }

    fn options() -> RunOptions {
        RunOptions::new("/tmp/fifu-executor-test")
    }

    fn run(item: &Item, opts: &RunOptions, r: &Scripted, stop: &dyn Fn() -> bool) -> (Outcome, Vec<DownloadProgress>) {
        let mut seen = Vec::new();
        let outcome = execute(item, opts, r, &mut |p| seen.push(p), stop);
        (outcome, seen)
    }

    #[test]
    fn phases_are_ordered_and_percent_monotonic() {
        let r = Scripted::new(
            vec![
                bytes(10, Some(100)),
                bytes(5, Some(100)),
                bytes(60, Some(100)),
                TransferEvent::Postprocessing,
            ],
            vec![Ok(Some(PathBuf::from("/tmp/x.mp4")))],
        );
        let item = Item::new("1", "Clip", "https://example.com/1").with_quality("audio");
        let (outcome, seen) = run(&item, &options(), &r, &|| false);
        assert_eq!(outcome.status, JobStatus::Completed);
        assert_eq!(outcome.file_path, Some(PathBuf::from("/tmp/x.mp4")));

        let statuses: Vec<_> = seen.iter().map(|p| p.status).collect();
        assert_eq!(statuses.first(), Some(&JobStatus::Starting));
        assert_eq!(statuses.last(), Some(&JobStatus::Finishing));
        let downloading: Vec<f64> = seen
            .iter()
            .filter(|p| p.status == JobStatus::Downloading)
            .map(|p| p.percent)
            .collect();
        assert_eq!(downloading, vec![10.0, 10.0, 60.0]);
        // Finishing emitted once even though the retriever returned after it.
        assert_eq!(statuses.iter().filter(|s| **s == JobStatus::Finishing).count(), 1);
    }

    #[test]
    fn subtitle_file_before_the_video_does_not_pin_percent() {
        let r = Scripted::new(
            vec![
                bytes(2_000, Some(2_000)),
                bytes(1_000_000, Some(100_000_000)),
                bytes(50_000_000, Some(100_000_000)),
            ],
            vec![Ok(None)],
        );
        let mut opts = options();
        opts.quality_spec = "audio".to_string();
        opts.subtitles = true;
        let item = Item::new("1", "Clip", "u");
        let (_, seen) = run(&item, &opts, &r, &|| false);
        let downloading: Vec<f64> = seen
            .iter()
            .filter(|p| p.status == JobStatus::Downloading)
            .map(|p| p.percent)
            .collect();
        assert_eq!(downloading.len(), 3);
        assert_eq!(downloading[0], 0.0);
        assert!(downloading[1] > 0.9 && downloading[1] < 1.1, "{downloading:?}");
        assert!((downloading[2] - 50.0).abs() < 0.1, "{downloading:?}");
    }

    #[test]
    fn merged_format_spreads_percent_over_both_streams() {
        let r = Scripted::new(
            vec![
                bytes(40, Some(80)),
                bytes(80, Some(80)),
                bytes(0, Some(20)),
                bytes(10, Some(20)),
            ],
            vec![Ok(None)],
        );
        let item = Item::new("1", "Clip", "u");
        let (_, seen) = run(&item, &options(), &r, &|| false);
        let downloading: Vec<f64> = seen
            .iter()
            .filter(|p| p.status == JobStatus::Downloading)
            .map(|p| p.percent)
            .collect();
        // Video fills the first half until the audio size is known.
        assert_eq!(downloading, vec![25.0, 50.0, 80.0, 90.0]);
    }

    #[test]
    fn unknown_total_reports_sentinel_percent() {
        let r = Scripted::new(vec![bytes(500, None)], vec![Ok(None)]);
        let item = Item::new("1", "Clip", "u");
        let (_, seen) = run(&item, &options(), &r, &|| false);
        let p = seen.iter().find(|p| p.status == JobStatus::Downloading).unwrap();
        assert_eq!(p.percent, crate::model::UNKNOWN_PERCENT);
    }

    #[test]
    fn stop_before_start_never_calls_retriever() {
        let r = Scripted::new(vec![], vec![Ok(None)]);
        let item = Item::new("1", "Clip", "u");
        let (outcome, seen) = run(&item, &options(), &r, &|| true);
        assert_eq!(outcome.status, JobStatus::Stopped);
        assert!(seen.is_empty());
        assert_eq!(r.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stop_mid_transfer_yields_stopped() {
        let flag = AtomicBool::new(false);
        let r = Scripted::new(
            vec![bytes(10, Some(100)), bytes(20, Some(100))],
            vec![Ok(None)],
        );
        let item = Item::new("1", "Clip", "u");
        let mut seen = Vec::new();
        let outcome = execute(
            &item,
            &options(),
            &r,
            &mut |p| {
                if p.status == JobStatus::Downloading {
                    flag.store(true, Ordering::SeqCst);
                }
                seen.push(p);
            },
            &|| flag.load(Ordering::SeqCst),
        );
        assert_eq!(outcome.status, JobStatus::Stopped);
        assert_eq!(
            seen.iter().filter(|p| p.status == JobStatus::Downloading).count(),
            1
        );
    }

    #[test]
    fn retrieval_error_becomes_failed_with_message() {
        let r = Scripted::new(
            vec![],
            vec![Err(TransferError::Failed("Video unavailable".into()))],
        );
        let item = Item::new("1", "Clip", "u");
        let (outcome, _) = run(&item, &options(), &r, &|| false);
        assert_eq!(outcome.status, JobStatus::Failed);
        assert_eq!(outcome.error.as_deref(), Some("Video unavailable"));
    }

    #[test]
    fn subtitle_failure_retries_once_without_subtitles() {
        let r = Scripted::new(
            vec![],
            vec![
                Err(TransferError::Subtitles("no subtitles".into())),
                Ok(Some(PathBuf::from("/tmp/x.mp4"))),
            ],
        );
        let mut opts = options();
        opts.subtitles = true;
        let item = Item::new("1", "Clip", "u");
        let (outcome, _) = run(&item, &opts, &r, &|| false);
        assert_eq!(outcome.status, JobStatus::Completed);
        assert_eq!(*r.subtitles_seen.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn second_subtitle_failure_is_not_retried_again() {
        let r = Scripted::new(
            vec![],
            vec![
                Err(TransferError::Subtitles("a".into())),
                Err(TransferError::Subtitles("b".into())),
            ],
        );
        let item = Item::new("1", "Clip", "u").with_subtitles(true);
        let (outcome, _) = run(&item, &options(), &r, &|| false);
        assert_eq!(outcome.status, JobStatus::Failed);
        assert_eq!(r.calls.load(Ordering::SeqCst), 2);
    }
}
