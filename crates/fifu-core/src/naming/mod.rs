//! Output naming: per-source directories and per-item file stems.
//!
//! Every component that needs to know where an item lands (the executor when
//! writing, the resume filter when scanning) goes through `output_stem`, so a
//! title always maps to the same file name.

mod sanitize;

pub use sanitize::sanitize_component;

use std::path::{Path, PathBuf};

/// Container extensions recognised as finished media files.
pub const MEDIA_EXTENSIONS: &[&str] = &["mp4", "mkv", "webm", "m4a", "mp3"];

/// Stem used when a title sanitizes to nothing.
const UNTITLED: &str = "untitled";

/// Directory name used when a source name sanitizes to nothing.
const UNKNOWN_SOURCE: &str = "unknown_channel";

/// File stem (no extension) for an item title.
///
/// # Examples
///
/// - `output_stem("What? Why: How")` → `"What Why How"`
/// - `output_stem("...")` → `"untitled"`
pub fn output_stem(title: &str) -> String {
    let stem = sanitize_component(title);
    if stem.is_empty() {
        UNTITLED.to_string()
    } else {
        stem
    }
}

/// Directory for one catalog source under `root`.
pub fn source_dir(root: &Path, source_name: &str) -> PathBuf {
    let name = sanitize_component(source_name);
    if name.is_empty() {
        root.join(UNKNOWN_SOURCE)
    } else {
        root.join(name)
    }
}

/// yt-dlp output template for `title` inside `dir`. `%` is doubled so titles
/// cannot inject template fields.
pub fn output_template(dir: &Path, title: &str) -> String {
    let stem = output_stem(title).replace('%', "%%");
    dir.join(format!("{stem}.%(ext)s")).to_string_lossy().into_owned()
}

/// True if `path` has one of the `MEDIA_EXTENSIONS` (case-insensitive).
pub fn has_media_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            MEDIA_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(e))
        })
        .unwrap_or(false)
}

/// First existing `dir/<stem>.<ext>` over `MEDIA_EXTENSIONS`.
pub fn find_existing_output(dir: &Path, stem: &str) -> Option<PathBuf> {
    MEDIA_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|p| p.is_file())
}
