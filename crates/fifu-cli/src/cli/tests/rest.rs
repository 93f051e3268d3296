//! Tests for search, listing, stop, history and favorites subcommands.

use super::{parse, parse_err};
use crate::cli::CliCommand;

#[test]
fn cli_parse_search_joins_words() {
    match parse(&["fifu", "search", "rust", "lang"]) {
        CliCommand::Search {
            query,
            max,
            no_history,
        } => {
            assert_eq!(query.join(" "), "rust lang");
            assert_eq!(max, 10);
            assert!(!no_history);
        }
        _ => panic!("expected Search"),
    }
    assert!(parse_err(&["fifu", "search"]));
}

#[test]
fn cli_parse_search_options() {
    match parse(&["fifu", "search", "-n", "3", "--no-history", "news"]) {
        CliCommand::Search {
            max, no_history, ..
        } => {
            assert_eq!(max, 3);
            assert!(no_history);
        }
        _ => panic!("expected Search with options"),
    }
}

#[test]
fn cli_parse_playlists_and_list() {
    match parse(&["fifu", "playlists", "UC123"]) {
        CliCommand::Playlists { channel_id } => assert_eq!(channel_id, "UC123"),
        _ => panic!("expected Playlists"),
    }
    match parse(&["fifu", "list", "@name", "--limit", "5", "--match", "live"]) {
        CliCommand::List {
            source,
            limit,
            filter,
        } => {
            assert_eq!(source, "@name");
            assert_eq!(limit, Some(5));
            assert_eq!(filter.as_deref(), Some("live"));
        }
        _ => panic!("expected List"),
    }
}

#[test]
fn cli_parse_stop_history_favorites() {
    assert!(matches!(parse(&["fifu", "stop"]), CliCommand::Stop));
    assert!(matches!(
        parse(&["fifu", "history"]),
        CliCommand::History { clear: false }
    ));
    assert!(matches!(
        parse(&["fifu", "history", "--clear"]),
        CliCommand::History { clear: true }
    ));
    assert!(matches!(parse(&["fifu", "favorites"]), CliCommand::Favorites));
    match parse(&["fifu", "favorite", "UC1", "--name", "Some Channel"]) {
        CliCommand::Favorite { channel_id, name } => {
            assert_eq!(channel_id, "UC1");
            assert_eq!(name.as_deref(), Some("Some Channel"));
        }
        _ => panic!("expected Favorite"),
    }
}

#[test]
fn cli_rejects_unknown_subcommand() {
    assert!(parse_err(&["fifu", "add", "x"]));
    assert!(parse_err(&["fifu"]));
}
