//! Error taxonomy for the RAM engine.
//!
//! `IndexDegraded` is deliberately not part of this enum — per the design,
//! degraded indexes are reported through `status()`, not raised as failures.

/// Stable error identifier plus an optional human-readable message. Never a
/// partially-updated store: every variant here is raised before or after a
/// transaction, never mid-transaction.
#[derive(Debug, thiserror::Error)]
pub enum RamError {
    #[error("content must not be empty")]
    EmptyContent,

    #[error("chunking produced zero usable chunks")]
    EmptyChunks,

    #[error("query must not be empty")]
    EmptyQuery,

    #[error("no embedder configured")]
    NotConfigured,

    #[error("storage error: {reason}")]
    StorageError { reason: String },

    #[error("no such memory: {id}")]
    NotFound { id: String },
}

pub type RamResult<T> = Result<T, RamError>;

impl RamError {
    pub fn storage(reason: impl Into<String>) -> Self {
        RamError::StorageError {
            reason: reason.into(),
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        RamError::NotFound { id: id.into() }
    }
}
