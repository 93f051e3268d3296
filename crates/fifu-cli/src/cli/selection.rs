//! Manual selection: title filter and 1-based index lists like `1,3,5-7`.

use anyhow::{bail, Result};
use fifu_core::model::Item;

/// Keeps items whose title contains `filter` (case-insensitive).
pub fn filter_items(items: Vec<Item>, filter: Option<&str>) -> Vec<Item> {
    let Some(needle) = filter.map(|f| f.trim().to_lowercase()).filter(|f| !f.is_empty()) else {
        return items;
    };
    items
        .into_iter()
        .filter(|item| item.title.to_lowercase().contains(&needle))
        .collect()
}

/// Parses `1,3,5-7` into sorted, deduplicated 0-based indices below `len`.
pub fn parse_selection(spec: &str, len: usize) -> Result<Vec<usize>> {
    let mut picked = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (start, end) = match part.split_once('-') {
            Some((a, b)) => (parse_position(a)?, parse_position(b)?),
            None => {
                let n = parse_position(part)?;
                (n, n)
            }
        };
        if start > end {
            bail!("invalid range {part}");
        }
        if end > len {
            bail!("selection {part} is out of range (1-{len})");
        }
        picked.extend((start - 1)..end);
    }
    if picked.is_empty() {
        bail!("empty selection");
    }
    picked.sort_unstable();
    picked.dedup();
    Ok(picked)
}

fn parse_position(s: &str) -> Result<usize> {
    match s.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => bail!("invalid position {s:?} (positions start at 1)"),
    }
}

/// Applies filter, then selection (positions refer to the filtered list).
pub fn select_items(items: Vec<Item>, filter: Option<&str>, selection: Option<&str>) -> Result<Vec<Item>> {
    let items = filter_items(items, filter);
    let Some(spec) = selection else {
        return Ok(items);
    };
    let picked = parse_selection(spec, items.len())?;
    Ok(items
        .into_iter()
        .enumerate()
        .filter(|(i, _)| picked.binary_search(i).is_ok())
        .map(|(_, item)| item)
        .collect())
}

/// `m:ss` or `h:mm:ss`; `N/A` when unknown or zero.
pub fn format_duration(seconds: Option<u64>) -> String {
    match seconds {
        None | Some(0) => "N/A".to_string(),
        Some(s) => {
            let (h, m, s) = (s / 3600, (s / 60) % 60, s % 60);
            if h > 0 {
                format!("{h}:{m:02}:{s:02}")
            } else {
                format!("{m}:{s:02}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(titles: &[&str]) -> Vec<Item> {
        titles
            .iter()
            .enumerate()
            .map(|(i, t)| Item::new(i.to_string(), *t, format!("u{i}")))
            .collect()
    }

    #[test]
    fn selection_ranges_and_singles() {
        assert_eq!(parse_selection("1,3,5-7", 10).unwrap(), vec![0, 2, 4, 5, 6]);
        assert_eq!(parse_selection(" 2 , 2,1-2 ", 3).unwrap(), vec![0, 1]);
    }

    #[test]
    fn invalid_selections_are_rejected() {
        assert!(parse_selection("0", 3).is_err());
        assert!(parse_selection("4", 3).is_err());
        assert!(parse_selection("3-1", 3).is_err());
        assert!(parse_selection("a", 3).is_err());
        assert!(parse_selection(",", 3).is_err());
    }

    #[test]
    fn filter_then_select() {
        let all = items(&["Rust Intro", "Cooking", "Advanced rust", "RUSTY"]);
        let picked = select_items(all, Some("rust"), Some("2-3")).unwrap();
        let titles: Vec<_> = picked.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Advanced rust", "RUSTY"]);
    }

    #[test]
    fn no_filter_no_selection_keeps_everything() {
        assert_eq!(select_items(items(&["a", "b"]), Some("  "), None).unwrap().len(), 2);
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(None), "N/A");
        assert_eq!(format_duration(Some(65)), "1:05");
        assert_eq!(format_duration(Some(3725)), "1:02:05");
    }
}
