use once_cell::sync::Lazy;
use regex::Regex;

/// Default chunk window in characters, sized so a chunk stays well within
/// the embedding model's token limit
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 4000;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapses runs of whitespace into single spaces and trims the ends.
///
/// PDF extraction tends to produce hard line breaks and repeated spaces;
/// normalizing before chunking keeps chunk boundaries meaningful.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Splits a long text into chunks of at most `max_chars` characters,
/// preferring to cut on a sentence boundary when one falls in the second
/// half of the window.
///
/// Returns no chunks for empty/whitespace-only input.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return vec![];
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let window_end = usize::min(chars.len(), start + max_chars);

        // Cut after the last period in the window, unless it would leave
        // the chunk shorter than half the window
        let cut = (start..window_end)
            .rev()
            .find(|&i| chars[i] == '.')
            .map(|i| i + 1)
            .filter(|&cut| cut - start >= max_chars / 2)
            .unwrap_or(window_end);

        let chunk: String = chars[start..cut].iter().collect();
        let chunk = chunk.trim().to_string();
        if !chunk.is_empty() {
            chunks.push(chunk);
        }

        start = cut;
    }

    chunks
}
