//! C2: splits normalized text into overlapping token windows.

use crate::capabilities::Tokenizer;
use crate::config::ChunkerConfig;
use crate::errors::RamResult;

/// Trim and collapse internal whitespace runs to a single space.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Produce the chunk sequence for `text` under `config`, using `tokenizer`
/// to measure and slice on token boundaries.
///
/// Empty input yields an empty sequence. Text that already fits within
/// `chunk_tokens` yields exactly one chunk (the normalized text itself,
/// without a tokenize/detokenize round trip). Otherwise a sliding window of
/// `chunk_tokens` with stride `max(1, chunk_tokens - overlap_tokens)` walks
/// the token sequence; each window is detokenized and trimmed, and empty
/// results are skipped.
pub fn chunk_text(
    text: &str,
    config: ChunkerConfig,
    tokenizer: &dyn Tokenizer,
) -> RamResult<Vec<String>> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return Ok(Vec::new());
    }

    let ids = tokenizer.tokenize(&normalized)?;
    if ids.len() <= config.chunk_tokens {
        return Ok(vec![normalized]);
    }

    let stride = config.chunk_tokens.saturating_sub(config.overlap_tokens).max(1);
    let total = ids.len();
    let mut chunks = Vec::new();
    let mut start = 0usize;
    loop {
        let end = (start + config.chunk_tokens).min(total);
        let window = &ids[start..end];
        let detok = tokenizer.decode(window)?;
        let trimmed = detok.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
        if end >= total {
            break;
        }
        start += stride;
    }
    Ok(chunks)
}
