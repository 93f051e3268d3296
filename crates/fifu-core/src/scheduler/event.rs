//! Events published by a run, consumed by the progress sink.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::model::{DownloadProgress, Outcome, RunState};

/// One message on the run's event channel. `index` is the item's position
/// in the run's input list.
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// Non-terminal progress snapshot; may be coalesced by the consumer.
    Progress {
        index: usize,
        progress: DownloadProgress,
    },
    /// Terminal outcome; sent exactly once per item, after its last progress.
    Outcome { index: usize, outcome: Outcome },
    /// Aggregate counters changed.
    Counts(RunState),
    /// Every item is terminal. Last event of a run.
    Finished(RunState),
}

/// Channel between one orchestrator (and its executors) and one sink.
pub fn event_channel() -> (UnboundedSender<RunEvent>, UnboundedReceiver<RunEvent>) {
    mpsc::unbounded_channel()
}
