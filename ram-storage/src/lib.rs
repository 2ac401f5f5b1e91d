//! # ram-storage
//!
//! SQLite persistence for the RAM engine: a single `memory.db` file holding
//! the record table, an FTS5 virtual table for lexical search, and a
//! best-effort ANN virtual table for vector search.
//!
//! ## Architecture
//!
//! ```text
//! Storage
//! ├── ConnectionPool (single writer + read pool)
//! ├── migrations (v001 records, v002 vector link table, v003 fts5)
//! ├── AnnIndex (Enabled | Disabled("reason"))
//! └── rows (CRUD, dedup probe, merge, recall-metric bump, siblings)
//! ```

pub mod ann;
pub mod dedup;
pub mod fts;
pub mod migrations;
pub mod pool;
pub mod rows;
pub mod store;

pub use ann::{AnnHit, AnnStatus};
pub use rows::{CountByKind, ListFilter};
pub use store::Storage;

use ram_core::RamError;

/// Map a rusqlite error to the storage-error taxonomy kind.
pub fn to_storage_err(reason: impl std::fmt::Display) -> RamError {
    RamError::storage(reason.to_string())
}
