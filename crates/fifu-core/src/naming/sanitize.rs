//! Cross-platform filename sanitization for titles and source names.

/// Longest stem we produce, in bytes. Leaves room for `.ext` and yt-dlp's
/// temporary suffixes under the common 255-byte NAME_MAX.
pub const MAX_STEM_BYTES: usize = 200;

/// Characters that are illegal in filenames on at least one supported platform.
const ILLEGAL: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Sanitizes a candidate filename stem.
///
/// - Removes `< > : " / \ | ? *` and control characters
/// - Trims leading/trailing spaces and dots
/// - Limits length to `MAX_STEM_BYTES` on a char boundary
///
/// Returns an empty string when nothing usable remains; callers pick the
/// placeholder.
pub fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !ILLEGAL.contains(c) && !c.is_control())
        .collect();

    let trimmed = cleaned.trim_matches(|c: char| c == ' ' || c == '.');

    if trimmed.len() > MAX_STEM_BYTES {
        let mut take = MAX_STEM_BYTES;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take]
            .trim_end_matches(|c: char| c == ' ' || c == '.')
            .to_string()
    } else {
        trimmed.to_string()
    }
}
