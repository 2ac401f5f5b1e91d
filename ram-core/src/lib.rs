//! # ram-core
//!
//! Shared types, capability traits, error taxonomy, and configuration for the
//! RAM memory engine. Every other crate in the workspace depends on this one
//! and nothing else upstream.

pub mod capabilities;
pub mod chunker;
pub mod config;
pub mod errors;
pub mod memory;
pub mod vector;

pub use capabilities::{Embedder, Tokenizer};
pub use chunker::chunk_text;
pub use errors::{RamError, RamResult};
pub use memory::{Kind, MemoryRecord, Scope};
pub use vector::cosine;
