//! Run control: a shared, idempotent stop flag.
//!
//! The orchestrator checks the flag before dispatching each item and hands a
//! clone into every executor, which polls it at each progress tick. A control
//! client (Ctrl-C handler, `fifu stop` via socket) only ever sets it.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle to one run's stop flag. Safe to use from any thread.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    stop: Arc<AtomicBool>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the run to stop. Idempotent; returns true only for the call
    /// that actually flipped the flag.
    pub fn request_stop(&self) -> bool {
        let first = !self.stop.swap(true, Ordering::SeqCst);
        if first {
            tracing::info!("stop requested");
        }
        first
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Clears the flag. Called by the orchestrator once a run has settled.
    pub fn reset(&self) {
        self.stop.store(false, Ordering::SeqCst);
    }
}

/// Default path for the control socket (XDG state dir, next to the log).
pub fn default_control_socket_path() -> std::io::Result<PathBuf> {
    let dir = xdg::BaseDirectories::with_prefix("fifu")?.get_state_home();
    Ok(dir.join("control.sock"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_stop_is_idempotent() {
        let control = RunControl::new();
        assert!(!control.is_stop_requested());
        assert!(control.request_stop());
        assert!(!control.request_stop());
        assert!(control.is_stop_requested());
    }

    #[test]
    fn reset_rearms_the_flag() {
        let control = RunControl::new();
        control.request_stop();
        control.reset();
        assert!(!control.is_stop_requested());
        assert!(control.request_stop());
    }

    #[test]
    fn clones_share_the_flag() {
        let control = RunControl::new();
        let remote = control.clone();
        std::thread::spawn(move || {
            remote.request_stop();
        })
        .join()
        .unwrap();
        assert!(control.is_stop_requested());
    }
}
