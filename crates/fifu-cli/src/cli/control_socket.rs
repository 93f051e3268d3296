//! Control socket: server (during `fifu fetch`/`fifu get`) and client (`fifu stop`).
//! Protocol: one line per command; only "stop" is understood.

use anyhow::Result;
use fifu_core::control::RunControl;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

/// Spawns a task that listens on `path` and requests a stop of `control`
/// for each "stop" line. Ignores anything else.
pub fn spawn_control_listener(
    control: RunControl,
    path: impl AsRef<Path>,
) -> Result<tokio::task::JoinHandle<()>> {
    let path = path.as_ref().to_path_buf();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let _ = std::fs::remove_file(&path);
    let listener = UnixListener::bind(&path)?;
    tracing::debug!(path = %path.display(), "control socket listening");

    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let control = control.clone();
                    tokio::spawn(async move {
                        let mut lines = BufReader::new(stream).lines();
                        while let Ok(Some(line)) = lines.next_line().await {
                            if line.trim() == "stop" {
                                control.request_stop();
                            } else {
                                tracing::debug!("control socket: ignoring {:?}", line);
                            }
                        }
                    });
                }
                Err(e) => tracing::debug!("control socket accept: {}", e),
            }
        }
    });
    Ok(handle)
}

/// Sends "stop\n". Returns false if no run is listening on `socket_path`.
pub async fn send_stop(socket_path: &Path) -> Result<bool> {
    if !socket_path.exists() {
        return Ok(false);
    }
    let mut stream = match UnixStream::connect(socket_path).await {
        Ok(stream) => stream,
        Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
            // Left behind by a run that did not exit cleanly.
            let _ = std::fs::remove_file(socket_path);
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };
    stream.write_all(b"stop\n").await?;
    stream.shutdown().await?;
    Ok(true)
}
