//! Best-effort lexical search against the `memory_fts` virtual table. Row
//! sync is driven explicitly by [`insert_row`]/[`delete_row`]/[`update_row`]
//! from `rows.rs`, each wrapped in the caller's own error-swallow, rather
//! than by a trigger inside the primary write's transaction — see
//! [`crate::migrations::v003_fts5_index`] for why.

use rusqlite::Connection;
use uuid::Uuid;

use ram_core::RamResult;

use crate::to_storage_err;

/// Insert a best-effort FTS row for `rowid`/`content`. Callers should treat
/// an `Err` here as "this row is missing from lexical search", not abort
/// the enclosing write.
pub fn insert_row(conn: &Connection, rowid: i64, content: &str) -> RamResult<()> {
    conn.execute(
        "INSERT INTO memory_fts(rowid, content) VALUES (?1, ?2)",
        rusqlite::params![rowid, content],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Remove the FTS entry for `rowid`. `content` must match what was indexed
/// (FTS5's external-content `delete` command validates it against the
/// shadow tables) — callers pass the pre-mutation content.
pub fn delete_row(conn: &Connection, rowid: i64, content: &str) -> RamResult<()> {
    conn.execute(
        "INSERT INTO memory_fts(memory_fts, rowid, content) VALUES ('delete', ?1, ?2)",
        rusqlite::params![rowid, content],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Replace the FTS entry for `rowid`: delete the old indexed content, then
/// insert the new. Used by merge, where `content` changes in place.
pub fn update_row(conn: &Connection, rowid: i64, old_content: &str, new_content: &str) -> RamResult<()> {
    delete_row(conn, rowid, old_content)?;
    insert_row(conn, rowid, new_content)
}

/// Returns up to `k` ids ranked by FTS5's bm25, best match first. Returns an
/// empty vector (never an error) if the FTS table is unavailable or the
/// query cannot be parsed as an FTS5 match expression — both are degraded
/// conditions the caller treats as "no lexical hits", not failures.
pub fn search(conn: &Connection, query: &str, k: usize) -> RamResult<Vec<Uuid>> {
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }
    let sql = "
        SELECT m.id
        FROM memory_fts f
        JOIN memories m ON m.rowid = f.rowid
        WHERE f.content MATCH ?1
        ORDER BY bm25(memory_fts)
        LIMIT ?2
    ";
    let mut stmt = match conn.prepare(sql) {
        Ok(s) => s,
        Err(_) => return Ok(Vec::new()),
    };
    let rows = match stmt.query_map(rusqlite::params![fts_match_expr(query), k as i64], |row| {
        row.get::<_, String>(0)
    }) {
        Ok(r) => r,
        Err(_) => return Ok(Vec::new()),
    };
    let mut ids = Vec::new();
    for row in rows {
        if let Ok(s) = row {
            if let Ok(id) = Uuid::parse_str(&s) {
                ids.push(id);
            }
        }
    }
    Ok(ids)
}

/// Whether the FTS virtual table currently exists (used to report degraded
/// status and to fall back to vector-only recall).
pub fn is_available(conn: &Connection) -> bool {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'memory_fts'",
        [],
        |row| row.get::<_, i64>(0),
    )
    .is_ok()
}

/// Quote each whitespace-separated term so punctuation in free-text queries
/// (URLs, code snippets) doesn't break FTS5's query-string grammar.
fn fts_match_expr(query: &str) -> String {
    query
        .split_whitespace()
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" OR ")
}

pub fn rebuild(conn: &Connection) -> RamResult<()> {
    conn.execute("INSERT INTO memory_fts(memory_fts) VALUES ('rebuild')", [])
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
