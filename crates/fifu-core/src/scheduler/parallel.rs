//! Bounded-concurrency dispatch loop.
//!
//! Keeps up to `concurrency_limit` executors in flight; when one finishes,
//! its outcome is settled and the next pending item (in input order) is
//! started, until the queue is empty or a stop drains it.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::task::JoinSet;

use super::ledger::Ledger;
use super::{Orchestrator, RunEvent};
use crate::error::RunError;
use crate::executor;
use crate::model::{Item, JobStatus, Outcome, RunOptions, RunReport};
use crate::resume;
use crate::retrieval::STOP_POLL_INTERVAL;

impl Orchestrator {
    /// Runs `items` to completion (or until stopped) and returns the report.
    ///
    /// Only a failure to create the destination directory aborts the run;
    /// per-item failures end up in the report. A stop requested before or
    /// during the run applies to this run only: the flag is cleared once it
    /// has settled, so the orchestrator can run again.
    pub async fn run(&self, items: Vec<Item>, options: RunOptions) -> Result<RunReport, RunError> {
        let mut options = options;
        options.concurrency_limit = options.concurrency_limit.max(1);

        std::fs::create_dir_all(&options.destination_dir).map_err(|source| {
            RunError::Filesystem {
                path: options.destination_dir.clone(),
                source,
            }
        })?;

        let items = Arc::new(items);
        let options = Arc::new(options);
        let mut ledger = Ledger::new(items.len());
        tracing::info!(
            items = items.len(),
            concurrency = options.concurrency_limit,
            dir = %options.destination_dir.display(),
            "run started"
        );

        let skip = resume::compute_skip_set(&options.destination_dir, &items);
        for (index, item) in items.iter().enumerate() {
            if skip.contains(&item.title) {
                self.settle(&mut ledger, index, Outcome::skipped(&item.title));
            }
        }
        self.emit(RunEvent::Counts(ledger.state()));

        let mut queue: VecDeque<usize> = (0..items.len())
            .filter(|i| !ledger.is_terminal(*i))
            .collect();
        let mut join_set: JoinSet<(usize, Outcome)> = JoinSet::new();

        loop {
            if self.control.is_stop_requested() {
                self.stop_pending(&mut ledger, &mut queue, &items);
            }

            while join_set.len() < options.concurrency_limit {
                if self.control.is_stop_requested() {
                    self.stop_pending(&mut ledger, &mut queue, &items);
                    break;
                }
                let Some(index) = queue.pop_front() else {
                    break;
                };
                ledger.mark_dispatched(index);
                self.dispatch(&mut join_set, index, Arc::clone(&items), Arc::clone(&options));
            }

            if join_set.is_empty() {
                break;
            }

            // Wake periodically while items are queued so a stop drains them
            // without waiting for a running item to finish.
            let waiting = !queue.is_empty();
            tokio::select! {
                joined = join_set.join_next() => match joined {
                    Some(Ok((index, outcome))) => self.settle(&mut ledger, index, outcome),
                    Some(Err(e)) => tracing::error!("executor task lost: {}", e),
                    None => break,
                },
                _ = tokio::time::sleep(STOP_POLL_INTERVAL), if waiting => {}
            }
        }

        for index in ledger.unsettled() {
            self.settle(
                &mut ledger,
                index,
                Outcome::failed(&items[index].title, "worker task lost"),
            );
        }

        let state = ledger.state();
        tracing::info!(
            completed = state.completed_count,
            failed = state.failed_count,
            skipped = state.skipped_count,
            stopped = state.stopped_count,
            "run finished"
        );
        self.emit(RunEvent::Finished(state));
        self.control.reset();
        Ok(ledger.into_report(&items))
    }

    fn dispatch(
        &self,
        join_set: &mut JoinSet<(usize, Outcome)>,
        index: usize,
        items: Arc<Vec<Item>>,
        options: Arc<RunOptions>,
    ) {
        let retriever = Arc::clone(&self.retriever);
        let control = self.control.clone();
        let events = self.events.clone();
        let title = items[index].title.clone();
        tracing::debug!(index, title = %title, "dispatching");

        join_set.spawn(async move {
            let worker = tokio::task::spawn_blocking(move || {
                let item = &items[index];
                executor::execute(
                    item,
                    &options,
                    retriever.as_ref(),
                    &mut |progress| {
                        let _ = events.send(RunEvent::Progress { index, progress });
                    },
                    &|| control.is_stop_requested(),
                )
            });
            let outcome = match worker.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(index, title = %title, "executor panicked: {}", e);
                    Outcome::failed(&title, format!("worker panicked: {e}"))
                }
            };
            (index, outcome)
        });
    }

    fn stop_pending(&self, ledger: &mut Ledger, queue: &mut VecDeque<usize>, items: &[Item]) {
        if !ledger.state().stop_requested {
            ledger.mark_stop_requested();
            tracing::info!(pending = queue.len(), "stop: no further items will start");
            self.emit(RunEvent::Counts(ledger.state()));
        }
        while let Some(index) = queue.pop_front() {
            self.settle(ledger, index, Outcome::stopped(&items[index].title));
        }
    }

    fn settle(&self, ledger: &mut Ledger, index: usize, outcome: Outcome) {
        let status = outcome.status;
        let title = outcome.title.clone();
        if !ledger.settle(index, outcome.clone()) {
            tracing::warn!(index, title = %title, "duplicate outcome ignored");
            return;
        }
        match status {
            JobStatus::Failed => tracing::warn!(
                index,
                title = %title,
                error = outcome.error.as_deref().unwrap_or_default(),
                "item failed"
            ),
            _ => tracing::info!(index, title = %title, status = status.label(), "item finished"),
        }
        self.emit(RunEvent::Outcome { index, outcome });
        self.emit(RunEvent::Counts(ledger.state()));
    }
}
