//! Quality presets and their yt-dlp format expressions.

use std::fmt;
use std::str::FromStr;

/// Fixed set of user-facing quality choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityPreset {
    Best,
    P1080,
    P720,
    P480,
    AudioOnly,
}

impl QualityPreset {
    pub fn format_expression(self) -> &'static str {
        match self {
            QualityPreset::Best => "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best",
            QualityPreset::P1080 => "bestvideo[height<=1080]+bestaudio/best[height<=1080]",
            QualityPreset::P720 => "bestvideo[height<=720]+bestaudio/best[height<=720]",
            QualityPreset::P480 => "bestvideo[height<=480]+bestaudio/best[height<=480]",
            QualityPreset::AudioOnly => "bestaudio/best",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            QualityPreset::Best => "best",
            QualityPreset::P1080 => "1080p",
            QualityPreset::P720 => "720p",
            QualityPreset::P480 => "480p",
            QualityPreset::AudioOnly => "audio",
        }
    }
}

impl fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QualityPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best" => Ok(QualityPreset::Best),
            "1080" | "1080p" => Ok(QualityPreset::P1080),
            "720" | "720p" => Ok(QualityPreset::P720),
            "480" | "480p" => Ok(QualityPreset::P480),
            "audio" | "audio-only" | "audio_only" => Ok(QualityPreset::AudioOnly),
            other => Err(format!("unknown quality preset: {other}")),
        }
    }
}

/// True if `spec` already is a yt-dlp format expression rather than a preset name.
pub fn is_format_expression(spec: &str) -> bool {
    spec.contains(['[', ']', '/', '+', '(', ')'])
}

/// Resolves a user quality spec to the format expression handed to yt-dlp.
///
/// Format expressions pass through; preset names are mapped; any other bare
/// word (e.g. `worst`, a format id like `22`) passes through unchanged.
pub fn resolve_format(spec: &str) -> String {
    let spec = spec.trim();
    if spec.is_empty() {
        return QualityPreset::Best.format_expression().to_string();
    }
    if is_format_expression(spec) {
        return spec.to_string();
    }
    match spec.parse::<QualityPreset>() {
        Ok(preset) => preset.format_expression().to_string(),
        Err(_) => spec.to_string(),
    }
}

/// True when the resolved format selects audio only, so no video muxing applies.
pub fn is_audio_only(format: &str) -> bool {
    format.starts_with("bestaudio") && !format.contains('+')
}

/// Number of separate media files the preferred alternative of `format`
/// downloads before merging (`bestvideo+bestaudio/best` → 2).
pub fn media_streams(format: &str) -> usize {
    let mut depth = 0usize;
    let mut streams = 1;
    for c in format.chars() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => break,
            '+' if depth == 0 => streams += 1,
            _ => {}
        }
    }
    streams
}
