//! Ordered, idempotent schema migrations. Each module guards its DDL with
//! `IF NOT EXISTS` so re-running on an already-migrated database is a no-op.
//! No destructive migration: only additive column/table creation.

pub mod v001_records;
pub mod v002_vector_link;
pub mod v003_fts5_index;

use rusqlite::Connection;

use ram_core::RamResult;

use crate::to_storage_err;

pub const CURRENT_SCHEMA_VERSION: i64 = 3;

/// Outcome of running migrations: whether the FTS5 virtual table and its
/// triggers were installed successfully. FTS is best-effort — the record
/// table and ANN link table are never allowed to fail migration.
pub struct MigrationReport {
    pub fts_available: bool,
    pub fts_error: Option<String>,
}

pub fn run(conn: &Connection) -> RamResult<MigrationReport> {
    v001_records::migrate(conn)?;
    v001_records::backfill_legacy_columns(conn)?;
    v002_vector_link::migrate(conn)?;

    let (fts_available, fts_error) = match v003_fts5_index::migrate(conn) {
        Ok(()) => (true, None),
        Err(e) => {
            tracing::warn!(error = %e, "fts5 index unavailable, continuing in degraded mode");
            (false, Some(e.to_string()))
        }
    };

    record_schema_version(conn, CURRENT_SCHEMA_VERSION)?;

    Ok(MigrationReport {
        fts_available,
        fts_error,
    })
}

fn record_schema_version(conn: &Connection, version: i64) -> RamResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO schema_version(version) VALUES (?1)",
        [version],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn schema_version(conn: &Connection) -> RamResult<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| to_storage_err(e.to_string()))
}
