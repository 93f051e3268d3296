//! Sink event loop.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::{Presenter, QueueView};
use crate::model::{DownloadProgress, JobStatus};
use crate::scheduler::RunEvent;

/// How long Completed/Failed items stay in the active view.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);
/// Minimum time between two renders.
pub const DEFAULT_RENDER_INTERVAL: Duration = Duration::from_millis(100);

/// Consumes one run's event channel and drives a presenter.
pub struct ProgressSink {
    rx: UnboundedReceiver<RunEvent>,
    grace_period: Duration,
    render_interval: Duration,
}

impl ProgressSink {
    pub fn new(rx: UnboundedReceiver<RunEvent>) -> Self {
        Self {
            rx,
            grace_period: DEFAULT_GRACE_PERIOD,
            render_interval: DEFAULT_RENDER_INTERVAL,
        }
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn with_render_interval(mut self, render_interval: Duration) -> Self {
        self.render_interval = render_interval.max(Duration::from_millis(1));
        self
    }

    /// Runs until `Finished` arrives or every sender is gone, then returns
    /// the presenter.
    pub async fn run<P: Presenter>(mut self, mut presenter: P) -> P {
        let mut view = QueueView::default();
        let mut pending: HashMap<usize, DownloadProgress> = HashMap::new();
        let mut removals: BTreeMap<usize, Instant> = BTreeMap::new();
        let mut dirty = false;

        let mut ticker = time::interval(self.render_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let next_removal = removals.values().min().copied();
            tokio::select! {
                biased;

                _ = time::sleep_until(next_removal.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600))),
                    if next_removal.is_some() =>
                {
                    let now = Instant::now();
                    removals.retain(|index, deadline| {
                        if *deadline <= now {
                            view.remove(*index);
                            false
                        } else {
                            true
                        }
                    });
                    dirty = true;
                }

                _ = ticker.tick() => {
                    dirty |= flush(&mut view, &mut pending);
                    if dirty {
                        presenter.render(&view);
                        dirty = false;
                    }
                }

                event = self.rx.recv() => match event {
                    Some(RunEvent::Progress { index, progress }) => {
                        if view.get(index).map_or(true, |p| !p.status.is_terminal()) {
                            pending.insert(index, progress);
                        }
                    }
                    Some(RunEvent::Outcome { index, outcome }) => {
                        pending.remove(&index);
                        view.apply_outcome(index, &outcome);
                        presenter.outcome(index, &outcome);
                        match outcome.status {
                            JobStatus::Completed | JobStatus::Failed => {
                                removals.insert(index, Instant::now() + self.grace_period);
                            }
                            _ => view.remove(index),
                        }
                        dirty = true;
                    }
                    Some(RunEvent::Counts(state)) => {
                        view.set_counts(state);
                        dirty = true;
                    }
                    Some(RunEvent::Finished(state)) => {
                        pending.clear();
                        removals.clear();
                        view.clear();
                        view.set_counts(state);
                        presenter.render(&view);
                        presenter.finished(&state);
                        return presenter;
                    }
                    None => {
                        if flush(&mut view, &mut pending) || dirty {
                            presenter.render(&view);
                        }
                        tracing::debug!("event channel closed before run finished");
                        return presenter;
                    }
                },
            }
        }
    }
}

/// Moves coalesced progress into the view. Returns true if anything changed.
fn flush(view: &mut QueueView, pending: &mut HashMap<usize, DownloadProgress>) -> bool {
    let changed = !pending.is_empty();
    for (index, progress) in pending.drain() {
        view.apply_progress(index, progress);
    }
    changed
}
