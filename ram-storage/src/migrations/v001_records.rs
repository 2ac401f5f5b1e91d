//! v001: the `memories` table and its secondary indexes, plus `schema_version`.

use rusqlite::Connection;

use ram_core::RamResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> RamResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version     INTEGER PRIMARY KEY,
            applied_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE TABLE IF NOT EXISTS memories (
            id                TEXT PRIMARY KEY,
            parent_id         TEXT NOT NULL,
            chunk_index       INTEGER NOT NULL DEFAULT 0,
            content           TEXT NOT NULL,
            kind              TEXT NOT NULL DEFAULT 'unclassified',
            scope             TEXT NOT NULL DEFAULT 'global',
            importance        REAL NOT NULL DEFAULT 0.5,
            token_count       INTEGER NOT NULL DEFAULT 0,
            recall_count      INTEGER NOT NULL DEFAULT 0,
            last_recalled_at  INTEGER,
            validity_score    REAL NOT NULL DEFAULT 1.0,
            is_negative       INTEGER NOT NULL DEFAULT 0,
            created_at        INTEGER NOT NULL,
            updated_at        INTEGER NOT NULL,
            embedding         BLOB
        );

        CREATE INDEX IF NOT EXISTS idx_memories_scope_updated
            ON memories(scope, updated_at DESC);
        CREATE INDEX IF NOT EXISTS idx_memories_parent_chunk
            ON memories(parent_id, chunk_index ASC);
        CREATE INDEX IF NOT EXISTS idx_memories_validity
            ON memories(validity_score DESC);
        CREATE INDEX IF NOT EXISTS idx_memories_kind
            ON memories(kind);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Additive forward-migration for legacy tables missing columns introduced
/// after the initial release. No destructive migration: columns are added
/// with defaults, `parent_id` is backfilled to `id` where empty.
pub fn backfill_legacy_columns(conn: &Connection) -> RamResult<()> {
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info('memories')")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let existing: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| to_storage_err(e.to_string()))?
        .filter_map(Result::ok)
        .collect();

    if !existing.iter().any(|c| c == "parent_id") {
        conn.execute_batch("ALTER TABLE memories ADD COLUMN parent_id TEXT NOT NULL DEFAULT '';")
            .map_err(|e| to_storage_err(e.to_string()))?;
        conn.execute(
            "UPDATE memories SET parent_id = id WHERE parent_id = ''",
            [],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    if !existing.iter().any(|c| c == "validity_score") {
        conn.execute_batch(
            "ALTER TABLE memories ADD COLUMN validity_score REAL NOT NULL DEFAULT 1.0;",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    if !existing.iter().any(|c| c == "is_negative") {
        conn.execute_batch(
            "ALTER TABLE memories ADD COLUMN is_negative INTEGER NOT NULL DEFAULT 0;",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    if !existing.iter().any(|c| c == "embedding") {
        conn.execute_batch("ALTER TABLE memories ADD COLUMN embedding BLOB;")
            .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}
