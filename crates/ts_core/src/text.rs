//! Prompt-size bounding shared by the language-model and speech stages.

const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Fraction of the window a sentence boundary must lie beyond to be used.
const BOUNDARY_WINDOW: f64 = 0.8;

/// Bounds `text` to at most `max_chars` characters.
///
/// Text that already fits is returned unchanged. Otherwise the cut lands just
/// after the last sentence terminator inside the window, provided it falls in
/// the trailing 20% of the window; failing that the text is cut hard at
/// `max_chars`.
pub fn truncate_at_sentence(text: &str, max_chars: usize) -> &str {
    let mut boundaries = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len()));
    let Some(hard_cut) = boundaries.nth(max_chars) else {
        return text;
    };
    if hard_cut == text.len() {
        return text;
    }

    let window = &text[..hard_cut];
    let threshold = (max_chars as f64 * BOUNDARY_WINDOW) as usize;
    let last_terminator = window
        .char_indices()
        .enumerate()
        .filter(|(_, (_, c))| SENTENCE_TERMINATORS.contains(c))
        .last();

    match last_terminator {
        Some((char_pos, (byte_pos, c))) if char_pos > threshold => &text[..byte_pos + c.len_utf8()],
        _ => window,
    }
}

/// Character count, as used by every size limit in the pipeline.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
