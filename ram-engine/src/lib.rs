//! # ram-engine
//!
//! C8: the public facade for the RAM memory engine. Wires chunking (C2) and
//! the injected Embedder/Tokenizer (C1) into storage (C3), query expansion
//! (C4), scoring (C5), MMR reranking (C6), and the kind classifier (C7)
//! behind nine operations: `remember`, `recall`/`recall_scored`,
//! `build_context`, `forget`, `list`, `open_memory`, `count_by_kind`,
//! `mark_invalid`, `status`.

mod cache;
mod context;
mod engine;
mod options;

pub use engine::Engine;
pub use options::{BuildContextOptions, CountByKindOptions, ListOptions, RecallOptions, RememberOptions};

pub use ram_core::{Kind, MemoryRecord, RamError, RamResult, Scope};
pub use ram_retrieval::ScoredCandidate;
pub use ram_storage::store::StorageStatus;
