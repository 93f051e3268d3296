//! Queue-level view handed to presenters.

use std::collections::BTreeMap;

use crate::model::{DownloadProgress, JobStatus, Outcome, RunState};

/// Active items (keyed by input index) plus the run counters.
#[derive(Debug, Clone, Default)]
pub struct QueueView {
    counts: RunState,
    active: BTreeMap<usize, DownloadProgress>,
}

impl QueueView {
    pub fn counts(&self) -> &RunState {
        &self.counts
    }

    /// Visible items in input order.
    pub fn active(&self) -> impl Iterator<Item = (usize, &DownloadProgress)> {
        self.active.iter().map(|(i, p)| (*i, p))
    }

    pub fn get(&self, index: usize) -> Option<&DownloadProgress> {
        self.active.get(&index)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub(crate) fn set_counts(&mut self, counts: RunState) {
        self.counts = counts;
    }

    /// Applies a non-terminal snapshot. Ignored once the item is terminal;
    /// percent never goes down within one phase.
    pub(crate) fn apply_progress(&mut self, index: usize, progress: DownloadProgress) {
        match self.active.get_mut(&index) {
            Some(current) if current.status.is_terminal() => {}
            Some(current) => {
                let floor = if current.status == progress.status {
                    current.percent
                } else {
                    0.0
                };
                *current = progress;
                current.percent = current.percent.max(floor);
            }
            None => {
                self.active.insert(index, progress);
            }
        }
    }

    /// Marks the item terminal, keeping its last byte counts.
    pub(crate) fn apply_outcome(&mut self, index: usize, outcome: &Outcome) {
        let entry = self.active.entry(index).or_insert_with(|| DownloadProgress {
            title: outcome.title.clone(),
            status: JobStatus::Pending,
            downloaded_bytes: 0,
            total_bytes: None,
            speed: None,
            eta: None,
            percent: 0.0,
        });
        entry.status = outcome.status;
        entry.speed = None;
        entry.eta = None;
        if outcome.status == JobStatus::Completed {
            entry.percent = 100.0;
        }
    }

    pub(crate) fn remove(&mut self, index: usize) {
        self.active.remove(&index);
    }

    pub(crate) fn clear(&mut self) {
        self.active.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(status: JobStatus, percent: f64) -> DownloadProgress {
        DownloadProgress {
            title: "a".into(),
            status,
            downloaded_bytes: 0,
            total_bytes: None,
            speed: None,
            eta: None,
            percent,
        }
    }

    #[test]
    fn percent_is_monotonic_within_a_phase() {
        let mut view = QueueView::default();
        view.apply_progress(0, progress(JobStatus::Downloading, 40.0));
        view.apply_progress(0, progress(JobStatus::Downloading, 30.0));
        assert_eq!(view.get(0).unwrap().percent, 40.0);
        view.apply_progress(0, progress(JobStatus::Finishing, 100.0));
        assert_eq!(view.get(0).unwrap().status, JobStatus::Finishing);
    }

    #[test]
    fn terminal_entries_ignore_late_progress() {
        let mut view = QueueView::default();
        view.apply_progress(0, progress(JobStatus::Downloading, 10.0));
        view.apply_outcome(0, &Outcome::failed("a", "boom"));
        view.apply_progress(0, progress(JobStatus::Downloading, 50.0));
        let entry = view.get(0).unwrap();
        assert_eq!(entry.status, JobStatus::Failed);
        assert_eq!(entry.percent, 10.0);
    }

    #[test]
    fn outcome_without_prior_progress_creates_entry() {
        let mut view = QueueView::default();
        view.apply_outcome(3, &Outcome::completed("c", None));
        assert_eq!(view.get(3).unwrap().percent, 100.0);
        assert_eq!(view.active().map(|(i, _)| i).collect::<Vec<_>>(), vec![3]);
    }
}
