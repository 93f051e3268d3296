//! Skip-on-resume: find items whose media file already sits in the destination.
//!
//! The directory is read once, non-recursively, before anything is scheduled.
//! Matching is by title: a regular file whose stem equals the item's output
//! stem and whose extension is a known media container counts as done.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::model::Item;
use crate::naming;

/// Returns the titles of `items` that are already present in `destination_dir`.
///
/// An unreadable or missing directory yields an empty set; the run proceeds
/// and simply downloads everything.
pub fn compute_skip_set(destination_dir: &Path, items: &[Item]) -> HashSet<String> {
    let present = match present_stems(destination_dir) {
        Ok(stems) => stems,
        Err(e) => {
            if e.kind() == std::io::ErrorKind::NotFound {
                tracing::debug!(dir = %destination_dir.display(), "destination does not exist yet");
            } else {
                tracing::warn!(dir = %destination_dir.display(), "cannot scan destination: {}", e);
            }
            return HashSet::new();
        }
    };

    items
        .iter()
        .filter(|item| present.contains(&naming::output_stem(&item.title)))
        .map(|item| item.title.clone())
        .collect()
}

/// Stems of media files directly inside `dir`.
fn present_stems(dir: &Path) -> std::io::Result<HashSet<String>> {
    let mut stems = HashSet::new();
    for entry in fs::read_dir(dir)? {
        let Ok(entry) = entry else { continue };
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        let path = entry.path();
        if !naming::has_media_extension(&path) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            stems.insert(stem.to_string());
        }
    }
    Ok(stems)
}
