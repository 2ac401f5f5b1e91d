//! External capability objects the engine is handed at construction time.
//!
//! Neither capability is implemented inside this crate — callers inject a
//! concrete `Embedder`/`Tokenizer` (an ONNX model, a remote API client, a
//! deterministic stub for tests). The engine only ever calls through the
//! trait object.

use crate::errors::RamResult;

/// Produces unit-norm, fixed-dimension float vectors from text.
pub trait Embedder: Send + Sync {
    /// Dimension of every vector this embedder returns.
    fn dimensions(&self) -> usize;

    /// Embed a single text. The returned vector has length `dimensions()`
    /// and `‖v‖₂ ≈ 1`.
    fn embed(&self, text: &str) -> RamResult<Vec<f32>>;

    /// Embed a batch. Default implementation embeds one at a time; a real
    /// provider should override this to exploit model batching.
    fn embed_batch(&self, texts: &[String]) -> RamResult<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Converts text to token ids and back. Used by the chunker to measure and
/// slice text on token boundaries rather than characters or bytes.
pub trait Tokenizer: Send + Sync {
    /// Tokenize without special tokens — the chunker operates on raw content.
    fn tokenize(&self, text: &str) -> RamResult<Vec<u32>>;

    /// Detokenize a slice of ids back to text, skipping special tokens.
    fn decode(&self, ids: &[u32]) -> RamResult<String>;

    /// Convenience: token count without materializing the id vector when a
    /// tokenizer can answer this more cheaply.
    fn count(&self, text: &str) -> RamResult<usize> {
        Ok(self.tokenize(text)?.len())
    }
}
