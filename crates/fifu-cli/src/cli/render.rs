//! Terminal presenter: live progress block plus permanent outcome lines.
//!
//! On a TTY the active items are redrawn in place (cursor-up + clear); when
//! output is piped only outcome lines and the final summary are written.

use std::io::{self, IsTerminal, Write};

use fifu_core::model::{DownloadProgress, JobStatus, Outcome, RunState};
use fifu_core::progress::{Presenter, QueueView};

const BAR_WIDTH: usize = 20;
const TITLE_WIDTH: usize = 48;

pub struct TerminalPresenter<W: Write + Send> {
    out: W,
    live: bool,
    /// Lines of the live block currently on screen.
    drawn: usize,
}

impl TerminalPresenter<io::Stdout> {
    pub fn stdout() -> Self {
        let live = io::stdout().is_terminal();
        Self::new(io::stdout(), live)
    }
}

impl<W: Write + Send> TerminalPresenter<W> {
    pub fn new(out: W, live: bool) -> Self {
        Self {
            out,
            live,
            drawn: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn clear_block(&mut self) {
        if self.live && self.drawn > 0 {
            let _ = write!(self.out, "\x1b[{}A\x1b[J", self.drawn);
            self.drawn = 0;
        }
    }
}

impl<W: Write + Send> Presenter for TerminalPresenter<W> {
    fn render(&mut self, view: &QueueView) {
        if !self.live {
            return;
        }
        self.clear_block();
        let lines = frame_lines(view);
        for line in &lines {
            let _ = writeln!(self.out, "{line}");
        }
        self.drawn = lines.len();
        let _ = self.out.flush();
    }

    fn outcome(&mut self, _index: usize, outcome: &Outcome) {
        self.clear_block();
        let _ = writeln!(self.out, "{}", outcome_line(outcome));
        let _ = self.out.flush();
    }

    fn finished(&mut self, state: &RunState) {
        self.clear_block();
        let _ = writeln!(self.out, "{}", summary_line(state));
        let _ = self.out.flush();
    }
}

/// Header with run counts followed by one line per active item.
pub fn frame_lines(view: &QueueView) -> Vec<String> {
    let counts = view.counts();
    let mut lines = Vec::with_capacity(view.len() + 1);
    lines.push(format!(
        "[{}/{}] {} done, {} failed, {} skipped",
        counts.finished_count(),
        counts.total_items,
        counts.completed_count,
        counts.failed_count,
        counts.skipped_count
    ));
    lines.extend(view.active().map(|(_, p)| progress_line(p)));
    lines
}

pub fn progress_line(p: &DownloadProgress) -> String {
    let filled = ((p.percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    let bar = format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled));
    let title = truncate(&p.title, TITLE_WIDTH);
    match p.status {
        JobStatus::Downloading => {
            let size = match p.total_bytes {
                Some(total) => format!("{}/{}", format_bytes(p.downloaded_bytes), format_bytes(total)),
                None => format_bytes(p.downloaded_bytes),
            };
            format!(
                "[{bar}] {:>5.1}% {title}  {size}  {}  ETA {}",
                p.percent,
                format_speed(p.speed),
                format_eta(p.eta)
            )
        }
        status => format!("[{bar}] {:>5.1}% {title}  {}", p.percent, status.label()),
    }
}

pub fn outcome_line(outcome: &Outcome) -> String {
    match outcome.status {
        JobStatus::Completed => match &outcome.file_path {
            Some(path) => format!("done     {} -> {}", outcome.title, path.display()),
            None => format!("done     {}", outcome.title),
        },
        JobStatus::Failed => format!(
            "failed   {}: {}",
            outcome.title,
            outcome.error.as_deref().unwrap_or("unknown error")
        ),
        JobStatus::Skipped => format!("skipped  {} (already downloaded)", outcome.title),
        JobStatus::Stopped => format!("stopped  {}", outcome.title),
        other => format!("{:<8} {}", other.label(), outcome.title),
    }
}

pub fn summary_line(state: &RunState) -> String {
    let mut line = format!(
        "Finished: {} completed, {} failed, {} skipped, {} stopped (of {})",
        state.completed_count,
        state.failed_count,
        state.skipped_count,
        state.stopped_count,
        state.total_items
    );
    if state.stop_requested {
        line.push_str(" - stopped by user");
    }
    line
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = "B";
    for u in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = u;
    }
    format!("{value:.1} {unit}")
}

pub fn format_speed(speed: Option<f64>) -> String {
    match speed {
        Some(s) if s > 0.0 => format!("{}/s", format_bytes(s as u64)),
        _ => "-".to_string(),
    }
}

pub fn format_eta(eta: Option<u64>) -> String {
    match eta {
        None => "?".to_string(),
        Some(s) if s >= 3600 => format!("{}:{:02}:{:02}", s / 3600, (s / 60) % 60, s % 60),
        Some(s) => format!("{}:{:02}", s / 60, s % 60),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
