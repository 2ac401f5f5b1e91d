//! Property test for invariant 1: concatenating chunks (without overlap)
//! covers every token, and consecutive chunks share exactly `overlap_tokens`
//! tokens except the last pair.

use proptest::prelude::*;

use ram_core::chunker::chunk_text;
use ram_core::config::ChunkerConfig;
use ram_core::errors::RamResult;
use ram_core::Tokenizer;

/// Splits on ASCII whitespace; ids are indices into the word list so decode
/// recovers the exact source words, letting the property assert on word
/// boundaries rather than opaque ids.
struct WordTokenizer {
    words: Vec<String>,
}

impl WordTokenizer {
    fn new(text: &str) -> Self {
        Self {
            words: text.split_whitespace().map(String::from).collect(),
        }
    }
}

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, _text: &str) -> RamResult<Vec<u32>> {
        Ok((0..self.words.len() as u32).collect())
    }

    fn decode(&self, ids: &[u32]) -> RamResult<String> {
        Ok(ids
            .iter()
            .filter_map(|&i| self.words.get(i as usize))
            .cloned()
            .collect::<Vec<_>>()
            .join(" "))
    }
}

proptest! {
    /// Every word in the source text appears in the chunk sequence, and
    /// consecutive chunks overlap by exactly `overlap_tokens` words (the
    /// last pair may overlap less, since the final window can be short).
    #[test]
    fn chunks_cover_every_token_with_expected_overlap(
        word_count in 1usize..400,
        chunk_tokens in 5usize..60,
        overlap_tokens in 0usize..4usize,
    ) {
        let overlap_tokens = overlap_tokens.min(chunk_tokens.saturating_sub(1));
        let words: Vec<String> = (0..word_count).map(|i| format!("w{i}")).collect();
        let text = words.join(" ");
        let tokenizer = WordTokenizer::new(&text);
        let config = ChunkerConfig { chunk_tokens, overlap_tokens };

        let chunks = chunk_text(&text, config, &tokenizer).unwrap();
        prop_assert!(!chunks.is_empty());

        if word_count <= chunk_tokens {
            prop_assert_eq!(chunks.len(), 1);
            prop_assert_eq!(&chunks[0], &text);
            return Ok(());
        }

        // Every source word appears in some chunk.
        let covered: std::collections::HashSet<&str> = chunks
            .iter()
            .flat_map(|c| c.split_whitespace())
            .collect();
        for w in &words {
            prop_assert!(covered.contains(w.as_str()), "missing word {w}");
        }

        // Stride between starts equals max(1, chunk_tokens - overlap_tokens);
        // each chunk's word count is at most chunk_tokens.
        let stride = chunk_tokens.saturating_sub(overlap_tokens).max(1);
        let chunk_words: Vec<Vec<&str>> = chunks.iter().map(|c| c.split_whitespace().collect()).collect();
        for w in &chunk_words {
            prop_assert!(w.len() <= chunk_tokens);
        }
        for pair in chunk_words.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            // `a`'s window started at some offset; `b` starts `stride` words later.
            // The first word of `b` is the word at index `stride` within `a`'s
            // window when `a` is a full window (not the shortened last one).
            if a.len() == chunk_tokens {
                prop_assert_eq!(a[stride.min(a.len() - 1)], b[0]);
            }
        }
    }

    /// Empty or whitespace-only input always yields an empty chunk sequence.
    #[test]
    fn blank_input_yields_no_chunks(padding in 0usize..10) {
        let text: String = " ".repeat(padding);
        let tokenizer = WordTokenizer::new(&text);
        let chunks = chunk_text(&text, ChunkerConfig::default(), &tokenizer).unwrap();
        prop_assert!(chunks.is_empty());
    }
}
