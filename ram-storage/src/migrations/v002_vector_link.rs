//! v002: rowid↔id mapping for the ANN vector index.
//!
//! The ANN virtual table itself (`vec_memories`, using the `vec0` module)
//! requires the extension to be loaded at runtime — handled by
//! [`crate::ann::AnnIndex::load`], not here. This migration only creates the
//! link table so inserts can resolve a memory id to the integer rowid the
//! vec0 module requires.

use rusqlite::Connection;

use ram_core::RamResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> RamResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS memory_vector_link (
            memory_id  TEXT PRIMARY KEY,
            vec_rowid  INTEGER NOT NULL UNIQUE,
            scope      TEXT NOT NULL,
            FOREIGN KEY (memory_id) REFERENCES memories(id) ON DELETE CASCADE
        );
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
