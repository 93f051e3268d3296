//! Progress sink: the single consumer of a run's events.
//!
//! Executors publish from many threads; the sink serializes everything on
//! one task, coalesces non-terminal progress per item, keeps finished items
//! visible for a grace period and hands the resulting `QueueView` to a
//! `Presenter`. Only the sink task ever touches the presenter.

mod sink;
mod view;

pub use sink::{ProgressSink, DEFAULT_GRACE_PERIOD, DEFAULT_RENDER_INTERVAL};
pub use view::QueueView;

use crate::model::{Outcome, RunState};

/// Presentation layer fed by the sink.
pub trait Presenter: Send {
    /// Draw the current queue. Called at most once per render interval.
    fn render(&mut self, view: &QueueView);

    /// An item reached its terminal state. Called immediately, once per item.
    fn outcome(&mut self, _index: usize, _outcome: &Outcome) {}

    /// The run is over; `state` holds the final counts.
    fn finished(&mut self, _state: &RunState) {}
}
