//! Sentence-aware text splitter.
//!
//! [`split`] cuts a document into consecutive pieces of at most
//! `target_size` characters, preferring to end each piece right after a
//! sentence delimiter. When a window holds no delimiter the piece is cut
//! hard at `target_size`.
//!
//! Sizes are counted in `char`s, so multi-byte scripts are measured the same
//! way as ASCII and every cut lands on a char boundary.

/// Characters that end a sentence. The delimiter stays with the sentence it
/// closes.
pub const SENTENCE_DELIMITERS: [char; 7] = ['.', '!', '?', '。', '！', '？', '\n'];

pub(crate) fn is_delimiter(c: char) -> bool {
    SENTENCE_DELIMITERS.contains(&c)
}

/// Split `text` into ordered chunks near `target_size` characters.
///
/// * Empty or whitespace-only text yields no chunks.
/// * Text of at most `target_size` characters yields itself.
/// * Otherwise each window of `target_size` characters is searched backward
///   for the closest delimiter; the chunk ends just after it, or exactly at
///   the window end when there is none. The remainder becomes the last chunk.
///
/// A piece that is only whitespace is folded into its neighbour (the
/// previous chunk, or the next one at the very start), so the chunks always
/// concatenate back to `text` and none of them is blank.
///
/// ```rust
/// use transcript_calibrate::chunking::split;
///
/// let chunks = split("One. Two. Three.", 10);
/// assert_eq!(chunks, vec!["One. Two.", " Three."]);
/// ```
pub fn split(text: &str, target_size: usize) -> Vec<&str> {
    let target = target_size.max(1);

    if text.trim().is_empty() {
        return Vec::new();
    }

    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let total = chars.len();
    if total <= target {
        return vec![text];
    }

    let byte_at = |i: usize| if i >= total { text.len() } else { chars[i].0 };

    // (start, end) byte spans of the raw pieces, in order.
    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut start = 0;
    while start < total {
        let end = start + target;
        if end >= total {
            spans.push((byte_at(start), text.len()));
            break;
        }

        let cut = (start..end)
            .rev()
            .find(|&i| is_delimiter(chars[i].1))
            .map(|i| i + 1)
            .unwrap_or(end);

        spans.push((byte_at(start), byte_at(cut)));
        start = cut;
    }

    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(spans.len());
    let mut pending_start: Option<usize> = None;
    for (s, e) in spans {
        if text[s..e].trim().is_empty() {
            match merged.last_mut() {
                Some(last) => last.1 = e,
                None => pending_start = pending_start.or(Some(s)),
            }
        } else {
            merged.push((pending_start.take().unwrap_or(s), e));
        }
    }

    merged.into_iter().map(|(s, e)| &text[s..e]).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
