//! Run orchestrator.
//!
//! Owns one run: applies the skip-set, dispatches the remaining items in
//! input order onto a bounded pool of blocking executors, settles every
//! item to exactly one terminal outcome and publishes `RunEvent`s to the
//! progress sink. Stop is cooperative through the shared `RunControl`.

mod event;
mod ledger;
mod parallel;

pub use event::{event_channel, RunEvent};

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::control::RunControl;
use crate::retrieval::Retriever;

/// Drives runs against one retriever and reports through one event channel.
pub struct Orchestrator {
    retriever: Arc<dyn Retriever>,
    control: RunControl,
    events: UnboundedSender<RunEvent>,
}

impl Orchestrator {
    pub fn new(retriever: Arc<dyn Retriever>, events: UnboundedSender<RunEvent>) -> Self {
        Self {
            retriever,
            control: RunControl::new(),
            events,
        }
    }

    /// Use an externally created stop flag (e.g. one already wired to Ctrl-C).
    pub fn with_control(mut self, control: RunControl) -> Self {
        self.control = control;
        self
    }

    /// Handle for stopping the run from another task or thread.
    pub fn control(&self) -> RunControl {
        self.control.clone()
    }

    /// Same as `control().request_stop()`.
    pub fn request_stop(&self) -> bool {
        self.control.request_stop()
    }

    fn emit(&self, event: RunEvent) {
        // A closed channel only means nobody is watching; the run goes on.
        let _ = self.events.send(event);
    }
}
