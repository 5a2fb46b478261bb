//! Character-safe text truncation shared by the transcript builder, the
//! tools and the logging helpers.

/// Appended to any text that was cut short.
pub const TRUNCATION_MARKER: &str = "... [truncated]";

/// Number of Unicode scalar values in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Keep at most `max_chars` characters. Returns the kept prefix and whether
/// anything was dropped.
pub fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (text[..byte_idx].to_string(), true),
        None => (text.to_string(), false),
    }
}

/// Truncate so the result, marker included, fits in `max_chars`.
pub fn truncate_with_marker(text: &str, max_chars: usize) -> String {
    if char_len(text) <= max_chars {
        return text.to_string();
    }
    let marker_len = char_len(TRUNCATION_MARKER);
    if max_chars <= marker_len {
        return truncate_chars(text, max_chars).0;
    }
    let (head, _) = truncate_chars(text, max_chars - marker_len);
    format!("{head}{TRUNCATION_MARKER}")
}

/// Keep the last `max_chars` characters.
pub fn tail_chars(text: &str, max_chars: usize) -> String {
    let total = char_len(text);
    if total <= max_chars {
        return text.to_string();
    }
    text.chars().skip(total - max_chars).collect()
}
