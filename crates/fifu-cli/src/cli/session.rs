//! One download run wired to the terminal: orchestrator, progress sink,
//! Ctrl-C and the control socket.

use anyhow::{Context, Result};
use fifu_core::config::FifuConfig;
use fifu_core::control::RunControl;
use fifu_core::model::{Item, RunOptions, RunReport};
use fifu_core::progress::ProgressSink;
use fifu_core::retrieval::YtDlpRetriever;
use fifu_core::scheduler::{event_channel, Orchestrator};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::render::TerminalPresenter;

pub async fn run_session(cfg: &FifuConfig, items: Vec<Item>, options: RunOptions) -> Result<RunReport> {
    let retriever = Arc::new(YtDlpRetriever::from_config(cfg));
    tracing::debug!(program = %retriever.program().display(), transferer = ?retriever.transferer(), "retriever ready");

    let (tx, rx) = event_channel();
    let orchestrator = Orchestrator::new(retriever, tx);
    let control = orchestrator.control();

    let ctrl_c = {
        let control = control.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nStopping: no new downloads will start, active ones are being cancelled...");
                control.request_stop();
            }
        })
    };

    let listener = listen_for_stop(&control);

    let sink = tokio::spawn(
        ProgressSink::new(rx)
            .with_grace_period(Duration::from_millis(cfg.grace_period_ms))
            .with_render_interval(Duration::from_millis(cfg.render_interval_ms))
            .run(TerminalPresenter::stdout()),
    );

    let result = orchestrator.run(items, options).await;
    // Closes the channel so the sink also ends when the run failed early.
    drop(orchestrator);
    if let Err(e) = sink.await {
        tracing::warn!("progress sink ended abnormally: {}", e);
    }

    ctrl_c.abort();
    if let Some((handle, path)) = listener {
        handle.abort();
        let _ = std::fs::remove_file(path);
    }

    result.context("download run failed")
}

/// Serves `fifu stop` for this run. Returns the listener task and socket path.
#[cfg(unix)]
fn listen_for_stop(control: &RunControl) -> Option<(tokio::task::JoinHandle<()>, PathBuf)> {
    let path = fifu_core::control::default_control_socket_path().ok()?;
    match super::control_socket::spawn_control_listener(control.clone(), &path) {
        Ok(handle) => Some((handle, path)),
        Err(e) => {
            tracing::warn!(path = %path.display(), "control socket unavailable: {:#}", e);
            None
        }
    }
}

#[cfg(not(unix))]
fn listen_for_stop(_control: &RunControl) -> Option<(tokio::task::JoinHandle<()>, PathBuf)> {
    None
}
