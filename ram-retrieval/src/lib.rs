//! # ram-retrieval
//!
//! Pure building blocks for hybrid recall: query expansion (C4), multi-signal
//! scoring (C5), and MMR diversity reranking (C6). None of this module talks
//! to storage — it operates on `MemoryRecord`s the caller has already loaded,
//! the same separation the teacher's `cortex-retrieval` crate draws between
//! `search` (storage-facing) and `ranking`/`expansion` (pure).

pub mod expansion;
pub mod rerank;
pub mod scorer;

pub use expansion::expand_query;
pub use rerank::mmr_select;
pub use scorer::{score_candidates, ScoredCandidate};
