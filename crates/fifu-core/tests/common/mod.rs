//! Scripted in-process retriever for orchestrator tests.
//!
//! Each item's locator selects a `Script`. The retriever tracks how many
//! transfers run at once and in which order they started.

#![allow(dead_code)]

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use fifu_core::error::TransferError;
use fifu_core::model::Item;
use fifu_core::retrieval::{Observer, RetrievalRequest, Retriever, TransferEvent};

#[derive(Debug, Clone)]
pub enum Script {
    /// Report `steps` byte samples `delay` apart, then write the output file.
    Complete { steps: u64, delay: Duration },
    /// One byte sample, then a silent post-processing step of `merge`.
    Linger { merge: Duration },
    Fail(String),
    Panic,
    /// Heartbeat until told to stop (gives up after ten seconds).
    Hang,
}

impl Default for Script {
    fn default() -> Self {
        Script::Complete {
            steps: 3,
            delay: Duration::from_millis(5),
        }
    }
}

#[derive(Default)]
pub struct FakeRetriever {
    scripts: HashMap<String, Script>,
    active: AtomicUsize,
    max_active: AtomicUsize,
    started: Mutex<Vec<String>>,
}

/// Decrements the active count even when the script panics.
struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(mut self, locator: &str, script: Script) -> Self {
        self.scripts.insert(locator.to_string(), script);
        self
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }
}

impl Retriever for FakeRetriever {
    fn retrieve(
        &self,
        request: &RetrievalRequest<'_>,
        observer: &mut Observer<'_>,
    ) -> Result<Option<PathBuf>, TransferError> {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = ActiveGuard(&self.active);
        self.max_active.fetch_max(now_active, Ordering::SeqCst);
        self.started
            .lock()
            .unwrap()
            .push(request.locator.to_string());

        match self.scripts.get(request.locator).cloned().unwrap_or_default() {
            Script::Complete { steps, delay } => {
                let total = steps * 10;
                for step in 1..=steps {
                    std::thread::sleep(delay);
                    let event = TransferEvent::Bytes {
                        downloaded: step * 10,
                        total: Some(total),
                        speed: Some(1000.0),
                        eta: Some(steps - step),
                    };
                    if let ControlFlow::Break(()) = observer(event) {
                        return Err(TransferError::Stopped);
                    }
                }
                if let ControlFlow::Break(()) = observer(TransferEvent::Postprocessing) {
                    return Err(TransferError::Stopped);
                }
                let path = request.output_dir.join(format!("{}.mp4", request.output_stem));
                std::fs::write(&path, b"media").map_err(|e| TransferError::Failed(e.to_string()))?;
                Ok(Some(path))
            }
            Script::Linger { merge } => {
                let event = TransferEvent::Bytes {
                    downloaded: 10,
                    total: Some(10),
                    speed: None,
                    eta: None,
                };
                if observer(event).is_break() || observer(TransferEvent::Postprocessing).is_break() {
                    return Err(TransferError::Stopped);
                }
                std::thread::sleep(merge);
                let path = request.output_dir.join(format!("{}.mp4", request.output_stem));
                std::fs::write(&path, b"media").map_err(|e| TransferError::Failed(e.to_string()))?;
                Ok(Some(path))
            }
            Script::Fail(msg) => Err(TransferError::Failed(msg)),
            Script::Panic => panic!("scripted retriever panic"),
            Script::Hang => {
                let deadline = Instant::now() + Duration::from_secs(10);
                while Instant::now() < deadline {
                    std::thread::sleep(Duration::from_millis(5));
                    if let ControlFlow::Break(()) = observer(TransferEvent::Heartbeat) {
                        return Err(TransferError::Stopped);
                    }
                }
                Err(TransferError::Failed("hang script timed out".to_string()))
            }
        }
    }
}

pub fn locator(i: usize) -> String {
    format!("fake://{i}")
}

/// Items titled `Item 0..n` with locators `fake://0..n`.
pub fn items(n: usize) -> Vec<Item> {
    (0..n)
        .map(|i| Item::new(format!("id{i}"), format!("Item {i}"), locator(i)))
        .collect()
}

/// Polls `cond` until it holds or `timeout` passes.
pub async fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}
