//! `fifu history` – show or clear recent searches.

use anyhow::Result;

use crate::cli::prefs::{prefs_path, Prefs};

pub fn run_history(clear: bool) -> Result<()> {
    let path = prefs_path()?;
    let mut prefs = Prefs::load_from(&path);
    if clear {
        prefs.clear_history();
        prefs.save_to(&path)?;
        println!("Search history cleared.");
        return Ok(());
    }
    if prefs.history.is_empty() {
        println!("No searches yet.");
    }
    for (i, query) in prefs.history.iter().enumerate() {
        println!("{:>2}. {}", i + 1, query);
    }
    Ok(())
}
