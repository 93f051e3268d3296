//! Per-item status bookkeeping for one run.

use crate::model::{Item, JobStatus, Outcome, RunReport, RunState};

/// Single-writer record of every item's status and outcome, owned by the
/// dispatch loop.
#[derive(Debug)]
pub(super) struct Ledger {
    statuses: Vec<JobStatus>,
    outcomes: Vec<Option<Outcome>>,
    state: RunState,
}

impl Ledger {
    pub(super) fn new(total: usize) -> Self {
        Self {
            statuses: vec![JobStatus::Pending; total],
            outcomes: vec![None; total],
            state: RunState::new(total),
        }
    }

    pub(super) fn state(&self) -> RunState {
        self.state
    }

    pub(super) fn is_terminal(&self, index: usize) -> bool {
        self.statuses[index].is_terminal()
    }

    pub(super) fn mark_dispatched(&mut self, index: usize) {
        if self.statuses[index] == JobStatus::Pending {
            self.statuses[index] = JobStatus::Starting;
        }
    }

    pub(super) fn mark_stop_requested(&mut self) {
        self.state.stop_requested = true;
    }

    /// Records the terminal outcome of `index`. Returns false if the item
    /// was already terminal (the outcome is then discarded).
    pub(super) fn settle(&mut self, index: usize, outcome: Outcome) -> bool {
        if self.statuses[index].is_terminal() || !outcome.status.is_terminal() {
            return false;
        }
        self.statuses[index] = outcome.status;
        self.state.record(outcome.status);
        self.outcomes[index] = Some(outcome);
        true
    }

    /// Indices of items that never reached a terminal state.
    pub(super) fn unsettled(&self) -> Vec<usize> {
        (0..self.statuses.len())
            .filter(|i| !self.statuses[*i].is_terminal())
            .collect()
    }

    pub(super) fn into_report(self, items: &[Item]) -> RunReport {
        let outcomes = self
            .outcomes
            .into_iter()
            .zip(items)
            .map(|(outcome, item)| {
                outcome.unwrap_or_else(|| Outcome::failed(&item.title, "worker task lost"))
            })
            .collect();
        RunReport {
            state: self.state,
            outcomes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_is_once_per_item() {
        let mut ledger = Ledger::new(2);
        assert!(ledger.settle(0, Outcome::completed("a", None)));
        assert!(!ledger.settle(0, Outcome::failed("a", "late")));
        assert_eq!(ledger.state().completed_count, 1);
        assert_eq!(ledger.state().failed_count, 0);
        assert!(!ledger.state().is_terminal());
        assert!(ledger.settle(1, Outcome::stopped("b")));
        assert!(ledger.state().is_terminal());
    }

    #[test]
    fn unsettled_items_are_reported_failed() {
        let items = vec![Item::new("1", "a", "u"), Item::new("2", "b", "u")];
        let mut ledger = Ledger::new(2);
        ledger.mark_dispatched(1);
        ledger.settle(0, Outcome::skipped("a"));
        assert_eq!(ledger.unsettled(), vec![1]);
        let report = ledger.into_report(&items);
        assert_eq!(report.outcomes[0].status, JobStatus::Skipped);
        assert_eq!(report.outcomes[1].status, JobStatus::Failed);
    }
}
