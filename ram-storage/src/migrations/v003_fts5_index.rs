//! v003: FTS5 virtual table over `content`. Best-effort: a failure to create
//! it here is reported by the caller as `IndexDegraded`, not fatal.
//!
//! Row sync is deliberately NOT done via triggers: an `AFTER INSERT` trigger
//! runs inside the same transaction as the primary row insert, so a failing
//! FTS5 write (e.g. a corrupt shadow table) would abort the whole write and
//! lose the caller's new rows — violating the best-effort contract in
//! `rows::insert_rows`. Instead [`crate::fts::insert_row`] et al. are called
//! explicitly from `rows.rs` with their own error-swallowing, the same
//! discipline `ann.rs` uses for the vector index.

use rusqlite::Connection;

use ram_core::RamResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> RamResult<()> {
    conn.execute_batch(
        "
        CREATE VIRTUAL TABLE IF NOT EXISTS memory_fts USING fts5(
            content,
            content='memories',
            content_rowid='rowid'
        );
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
