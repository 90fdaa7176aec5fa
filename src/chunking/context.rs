//! Trailing-context extraction.
//!
//! The last sentence of one chunk is handed to the request for the next
//! chunk so independently processed pieces still read as one document. It
//! is only ever used as a hint; the chunk's own text is never modified.

use super::splitter::is_delimiter;

/// Return the final sentence of `text`, trimmed.
///
/// Sentences are split with the same delimiter set as the splitter and keep
/// their trailing delimiter. Blank trailing pieces are skipped, so text that
/// ends with a delimiter still yields its last real sentence. Returns an
/// empty string for empty or blank input.
///
/// ```rust
/// use transcript_calibrate::chunking::last_sentence;
///
/// assert_eq!(last_sentence("A. B."), "B.");
/// assert_eq!(last_sentence(""), "");
/// ```
pub fn last_sentence(text: &str) -> String {
    text.split_inclusive(is_delimiter)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .last()
        .unwrap_or("")
        .to_string()
}
