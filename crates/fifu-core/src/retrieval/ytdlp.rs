//! yt-dlp subprocess retriever.
//!
//! One child process per item, started in its own process group so a stop
//! kills the whole tree (including an aria2c transfer it spawned). Output is
//! read by two pump threads and consumed here with a bounded wait, so the
//! observer gets a heartbeat at least every `STOP_POLL_INTERVAL`.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use super::parse::{is_subtitle_error, parse_line, ParsedLine, FILE_MARKER, POSTPROCESS_MARKER, PROGRESS_MARKER};
use super::{Observer, RetrievalRequest, Retriever, TransferEvent, Transferer};
use crate::config::FifuConfig;
use crate::error::TransferError;
use crate::naming;
use crate::quality;

/// Longest time a running transfer goes without checking for stop.
pub const STOP_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Stderr lines kept for the failure message when no `ERROR:` line shows up.
const STDERR_TAIL_LINES: usize = 5;

/// Resolves the yt-dlp binary: explicit path, then PATH, then the bare name.
pub fn locate_yt_dlp(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    which::which("yt-dlp").unwrap_or_else(|_| PathBuf::from("yt-dlp"))
}

/// Production `Retriever` backed by the yt-dlp command line.
#[derive(Debug, Clone)]
pub struct YtDlpRetriever {
    program: PathBuf,
    leading_args: Vec<String>,
    transferer: Transferer,
}

impl YtDlpRetriever {
    pub fn new(program: impl Into<PathBuf>, transferer: Transferer) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            transferer,
        }
    }

    /// Builds the retriever for one run: binary lookup and accelerator probe
    /// happen here, once.
    pub fn from_config(cfg: &FifuConfig) -> Self {
        let program = locate_yt_dlp(cfg.yt_dlp_path.as_deref());
        let transferer = Transferer::select(&cfg.accelerator);
        Self::new(program, transferer).with_leading_args(cfg.yt_dlp_args.clone())
    }

    /// Arguments placed before everything else (e.g. cookies, or a script
    /// path when `program` is an interpreter).
    pub fn with_leading_args(mut self, args: Vec<String>) -> Self {
        self.leading_args = args;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn transferer(&self) -> &Transferer {
        &self.transferer
    }

    /// Full argument list for one request.
    pub fn build_args(&self, request: &RetrievalRequest<'_>) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.extend(
            [
                "--newline",
                "--progress",
                "--no-simulate",
                "--no-warnings",
                "--no-playlist",
                "--progress-template",
            ]
            .map(String::from),
        );
        args.push(format!(
            "download:{PROGRESS_MARKER} %(progress.downloaded_bytes)s %(progress.total_bytes)s \
             %(progress.total_bytes_estimate)s %(progress.speed)s %(progress.eta)s"
        ));
        args.push("--progress-template".to_string());
        args.push(format!(
            "postprocess:{POSTPROCESS_MARKER} %(progress.status)s %(progress.postprocessor)s"
        ));
        args.push("--print".to_string());
        args.push(format!("after_move:{FILE_MARKER} %(filepath)s"));
        args.push("-f".to_string());
        args.push(request.format.to_string());
        args.push("-o".to_string());
        args.push(request.output_template.to_string());
        if !quality::is_audio_only(request.format) {
            args.push("--merge-output-format".to_string());
            args.push("mp4".to_string());
        }
        if request.subtitles {
            args.extend(
                [
                    "--write-subs",
                    "--write-auto-subs",
                    "--sub-langs",
                    "en.*,en",
                    "--embed-subs",
                ]
                .map(String::from),
            );
        }
        args.extend(self.transferer.downloader_args());
        args.push("--".to_string());
        args.push(request.locator.to_string());
        args
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

struct OutputLine {
    stream: Stream,
    text: String,
}

impl Retriever for YtDlpRetriever {
    fn retrieve(
        &self,
        request: &RetrievalRequest<'_>,
        observer: &mut Observer<'_>,
    ) -> Result<Option<PathBuf>, TransferError> {
        let args = self.build_args(request);
        tracing::debug!(program = %self.program.display(), locator = request.locator, "spawning yt-dlp");

        let mut cmd = Command::new(&self.program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        let mut child = cmd.spawn().map_err(|source| TransferError::Launch {
            program: self.program.display().to_string(),
            source,
        })?;

        let (tx, rx) = mpsc::channel();
        let mut pumps = Vec::with_capacity(2);
        if let Some(out) = child.stdout.take() {
            pumps.push(spawn_pump(out, Stream::Stdout, tx.clone()));
        }
        if let Some(err) = child.stderr.take() {
            pumps.push(spawn_pump(err, Stream::Stderr, tx.clone()));
        }
        drop(tx);

        let mut output_file = None;
        let mut last_error: Option<String> = None;
        let mut stderr_tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);

        loop {
            let event = match rx.recv_timeout(STOP_POLL_INTERVAL) {
                Ok(line) => match parse_line(&line.text) {
                    ParsedLine::Event(event) => Some(event),
                    ParsedLine::OutputFile(path) => {
                        output_file = Some(path);
                        None
                    }
                    ParsedLine::Error(msg) => {
                        last_error = Some(msg);
                        None
                    }
                    ParsedLine::Other => {
                        if line.stream == Stream::Stderr && !line.text.trim().is_empty() {
                            if stderr_tail.len() == STDERR_TAIL_LINES {
                                stderr_tail.pop_front();
                            }
                            stderr_tail.push_back(line.text.trim().to_string());
                        }
                        None
                    }
                },
                Err(RecvTimeoutError::Timeout) => Some(TransferEvent::Heartbeat),
                Err(RecvTimeoutError::Disconnected) => break,
            };
            if let Some(event) = event {
                if let ControlFlow::Break(()) = observer(event) {
                    terminate(&mut child);
                    drop(rx);
                    join_pumps(pumps);
                    tracing::info!(locator = request.locator, "transfer stopped");
                    return Err(TransferError::Stopped);
                }
            }
        }

        join_pumps(pumps);
        let status = child.wait().map_err(|e| TransferError::Failed(e.to_string()))?;
        if !status.success() {
            let subtitles_failed =
                request.subtitles && last_error.as_deref().is_some_and(is_subtitle_error);
            let message = last_error
                .or_else(|| (!stderr_tail.is_empty()).then(|| Vec::from(stderr_tail).join("; ")))
                .unwrap_or_else(|| format!("yt-dlp exited with {status}"));
            if subtitles_failed {
                return Err(TransferError::Subtitles(message));
            }
            return Err(TransferError::Failed(message));
        }

        let path = output_file
            .filter(|p| p.is_file())
            .or_else(|| naming::find_existing_output(request.output_dir, request.output_stem));
        Ok(path)
    }
}

fn spawn_pump<R: Read + Send + 'static>(
    reader: R,
    stream: Stream,
    tx: Sender<OutputLine>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&buf).trim_end().to_string();
                    if tx.send(OutputLine { stream, text }).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

fn join_pumps(pumps: Vec<JoinHandle<()>>) {
    for pump in pumps {
        let _ = pump.join();
    }
}

/// Kills the child's whole process group, then reaps the child.
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pgid) = i32::try_from(child.id()) {
            // SAFETY: plain syscall; a negative pid addresses the group we created.
            unsafe {
                libc::kill(-pgid, libc::SIGKILL);
            }
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}
