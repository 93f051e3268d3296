//! Parsing of yt-dlp output lines produced by our progress/print templates.

use std::path::PathBuf;

use super::TransferEvent;

/// Prefix of download progress lines (`--progress-template download:...`).
pub const PROGRESS_MARKER: &str = "fifu-progress";
/// Prefix of post-processing lines (`--progress-template postprocess:...`).
pub const POSTPROCESS_MARKER: &str = "fifu-postprocess";
/// Prefix of the final path line (`--print after_move:...`).
pub const FILE_MARKER: &str = "fifu-file";

/// Error texts (after `ERROR:`) raised by yt-dlp's subtitle download step.
const SUBTITLE_ERRORS: &[&str] = &["unable to download video subtitles", "unable to download subtitle"];

/// One classified output line.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    Event(TransferEvent),
    OutputFile(PathBuf),
    Error(String),
    Other,
}

/// Classifies one line of yt-dlp output.
///
/// Progress lines carry `downloaded total total_estimate speed eta`, where any
/// field may be `NA`/`None` and numbers may be floats.
pub fn parse_line(line: &str) -> ParsedLine {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix(PROGRESS_MARKER) {
        return match parse_progress(rest) {
            Some(event) => ParsedLine::Event(event),
            None => ParsedLine::Other,
        };
    }
    if line.starts_with(POSTPROCESS_MARKER) {
        return ParsedLine::Event(TransferEvent::Postprocessing);
    }
    if let Some(rest) = line.strip_prefix(FILE_MARKER) {
        let path = rest.trim();
        if !path.is_empty() {
            return ParsedLine::OutputFile(PathBuf::from(path));
        }
        return ParsedLine::Other;
    }
    if let Some(msg) = line.strip_prefix("ERROR:") {
        return ParsedLine::Error(msg.trim().to_string());
    }
    // yt-dlp's own post-processor announcements, printed without our template.
    if line.starts_with("[Merger]")
        || line.starts_with("[EmbedSubtitle]")
        || line.starts_with("[ExtractAudio]")
        || line.starts_with("[FixupM3u8]")
        || line.starts_with("[VideoConvertor]")
    {
        return ParsedLine::Event(TransferEvent::Postprocessing);
    }
    ParsedLine::Other
}

/// True if an `ERROR:` message comes from fetching subtitles, either at the
/// start of the message or after an `[extractor] id:` prefix.
pub fn is_subtitle_error(message: &str) -> bool {
    let lower = message.trim().to_ascii_lowercase();
    SUBTITLE_ERRORS.iter().any(|known| {
        lower.starts_with(known)
            || lower
                .split_once("]")
                .and_then(|(_, rest)| rest.split_once(": "))
                .is_some_and(|(_, rest)| rest.starts_with(known))
    })
}

fn parse_progress(rest: &str) -> Option<TransferEvent> {
    let mut fields = rest.split_whitespace();
    let downloaded = number(fields.next()?)?;
    let total = fields.next().and_then(number);
    let estimate = fields.next().and_then(number);
    let speed = fields.next().and_then(number);
    let eta = fields.next().and_then(number);
    Some(TransferEvent::Bytes {
        downloaded: downloaded as u64,
        total: total.or(estimate).filter(|t| *t > 0.0).map(|t| t as u64),
        speed: speed.filter(|s| *s >= 0.0),
        eta: eta.filter(|e| *e >= 0.0).map(|e| e as u64),
    })
}

fn number(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtitle_errors_are_recognized_by_their_prefix() {
        assert!(is_subtitle_error("Unable to download video subtitles for 'en': HTTP Error 429"));
        assert!(is_subtitle_error("[youtube] abc: Unable to download subtitle for 'de'"));
        assert!(!is_subtitle_error("[youtube] abc: Video unavailable. Subtitles are disabled"));
        assert!(!is_subtitle_error("unable to write subtitle file list: disk full, subtitle"));
        assert!(!is_subtitle_error("Postprocessing: Conversion failed!"));
    }

    #[test]
    fn progress_line_with_all_fields() {
        let parsed = parse_line("fifu-progress 1024 4096 NA 512.5 6");
        assert_eq!(
            parsed,
            ParsedLine::Event(TransferEvent::Bytes {
                downloaded: 1024,
                total: Some(4096),
                speed: Some(512.5),
                eta: Some(6),
            })
        );
    }

    #[test]
    fn progress_line_uses_estimate_when_total_missing() {
        match parse_line("fifu-progress 100 NA 1000.0 NA NA") {
            ParsedLine::Event(TransferEvent::Bytes { total, speed, eta, .. }) => {
                assert_eq!(total, Some(1000));
                assert_eq!(speed, None);
                assert_eq!(eta, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn progress_line_with_unknown_size() {
        match parse_line("  fifu-progress 100 NA NA NA NA  ") {
            ParsedLine::Event(TransferEvent::Bytes { downloaded, total, .. }) => {
                assert_eq!(downloaded, 100);
                assert_eq!(total, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn malformed_progress_is_ignored() {
        assert_eq!(parse_line("fifu-progress NA"), ParsedLine::Other);
        assert_eq!(parse_line("fifu-progress"), ParsedLine::Other);
    }

    #[test]
    fn postprocess_file_and_error_lines() {
        assert_eq!(
            parse_line("fifu-postprocess started Merger"),
            ParsedLine::Event(TransferEvent::Postprocessing)
        );
        assert_eq!(
            parse_line("[Merger] Merging formats into \"x.mp4\""),
            ParsedLine::Event(TransferEvent::Postprocessing)
        );
        assert_eq!(
            parse_line("fifu-file /tmp/My Clip.mp4"),
            ParsedLine::OutputFile(PathBuf::from("/tmp/My Clip.mp4"))
        );
        assert_eq!(
            parse_line("ERROR: [youtube] abc: Video unavailable"),
            ParsedLine::Error("[youtube] abc: Video unavailable".to_string())
        );
        assert_eq!(parse_line("[download] Destination: x"), ParsedLine::Other);
    }
}
