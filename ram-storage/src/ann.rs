//! Best-effort ANN vector index over `(id, D-dim vector, scope)`, backed by
//! the `vec0` SQLite extension loaded at runtime.
//!
//! State machine: `Uninitialized → (loadExtension) → Enabled | Disabled`.
//! `Disabled` is terminal within a process: vector search returns empty,
//! dedup becomes a no-op, classifier density falls back to prototype-only.

use rusqlite::Connection;
use uuid::Uuid;

use ram_core::RamResult;

use crate::to_storage_err;

#[derive(Debug, Clone, PartialEq)]
pub enum AnnStatus {
    Enabled,
    Disabled { reason: String },
}

impl AnnStatus {
    pub fn enabled(&self) -> bool {
        matches!(self, AnnStatus::Enabled)
    }

    pub fn message(&self) -> String {
        match self {
            AnnStatus::Enabled => "ann index active".to_string(),
            AnnStatus::Disabled { reason } => reason.clone(),
        }
    }
}

pub struct AnnHit {
    pub id: Uuid,
    pub distance: f64,
}

/// Wraps the `vec0` virtual table. `dimensions` is fixed for the process
/// lifetime (D = 384 per the data model).
pub struct AnnIndex {
    status: AnnStatus,
    dimensions: usize,
}

impl AnnIndex {
    /// Attempt to load the `vec0` extension and create the virtual table.
    /// Never returns `Err` — failure is represented as `Disabled`, matching
    /// the "best-effort" contract for this index.
    pub fn load(conn: &Connection, dimensions: usize) -> Self {
        match try_load(conn, dimensions) {
            Ok(()) => {
                tracing::info!(dimensions, "ann vector index enabled");
                Self {
                    status: AnnStatus::Enabled,
                    dimensions,
                }
            }
            Err(reason) => {
                tracing::warn!(%reason, "ann vector index disabled");
                Self {
                    status: AnnStatus::Disabled { reason },
                    dimensions,
                }
            }
        }
    }

    pub fn status(&self) -> &AnnStatus {
        &self.status
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Insert or replace a vector for `id`. No-op when disabled.
    pub fn upsert(
        &self,
        conn: &Connection,
        id: Uuid,
        scope: &str,
        embedding: &[f32],
    ) -> RamResult<()> {
        if !self.status.enabled() {
            return Ok(());
        }
        let id_str = id.to_string();
        let rowid: i64 = conn
            .query_row(
                "SELECT vec_rowid FROM memory_vector_link WHERE memory_id = ?1",
                [&id_str],
                |row| row.get(0),
            )
            .unwrap_or(-1);

        let rowid = if rowid >= 0 {
            conn.execute(
                "UPDATE memory_vector_link SET scope = ?2 WHERE memory_id = ?1",
                rusqlite::params![id_str, scope],
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
            rowid
        } else {
            conn.execute(
                "INSERT INTO memory_vector_link(memory_id, vec_rowid, scope)
                 VALUES (?1, (SELECT COALESCE(MAX(vec_rowid), 0) + 1 FROM memory_vector_link), ?2)",
                rusqlite::params![id_str, scope],
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
            conn.query_row(
                "SELECT vec_rowid FROM memory_vector_link WHERE memory_id = ?1",
                [&id_str],
                |row| row.get(0),
            )
            .map_err(|e| to_storage_err(e.to_string()))?
        };

        let blob = encode_vector(embedding);
        conn.execute(
            "INSERT INTO vec_memories(rowid, embedding) VALUES (?1, ?2)
             ON CONFLICT(rowid) DO UPDATE SET embedding = excluded.embedding",
            rusqlite::params![rowid, blob],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
        Ok(())
    }

    /// Remove the vector entry for `id`. No-op when disabled or absent.
    pub fn delete(&self, conn: &Connection, id: Uuid) -> RamResult<()> {
        if !self.status.enabled() {
            return Ok(());
        }
        let id_str = id.to_string();
        if let Ok(rowid) = conn.query_row::<i64, _, _>(
            "SELECT vec_rowid FROM memory_vector_link WHERE memory_id = ?1",
            [&id_str],
            |row| row.get(0),
        ) {
            conn.execute("DELETE FROM vec_memories WHERE rowid = ?1", [rowid])
                .map_err(|e| to_storage_err(e.to_string()))?;
        }
        conn.execute(
            "DELETE FROM memory_vector_link WHERE memory_id = ?1",
            [&id_str],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
        Ok(())
    }

    /// k-NN query, optionally restricted to `scope`. Returns `(id, distance)`
    /// ascending by distance. Empty when disabled.
    pub fn query(
        &self,
        conn: &Connection,
        query: &[f32],
        k: usize,
        scope: Option<&str>,
    ) -> RamResult<Vec<AnnHit>> {
        if !self.status.enabled() {
            return Ok(Vec::new());
        }
        let blob = encode_vector(query);
        let sql = match scope {
            Some(_) => {
                "SELECT l.memory_id, v.distance
                 FROM vec_memories v
                 JOIN memory_vector_link l ON l.vec_rowid = v.rowid
                 WHERE v.embedding MATCH ?1 AND k = ?2 AND l.scope = ?3
                 ORDER BY v.distance"
            }
            None => {
                "SELECT l.memory_id, v.distance
                 FROM vec_memories v
                 JOIN memory_vector_link l ON l.vec_rowid = v.rowid
                 WHERE v.embedding MATCH ?1 AND k = ?2
                 ORDER BY v.distance"
            }
        };
        let mut stmt = conn.prepare(sql).map_err(|e| to_storage_err(e.to_string()))?;
        let rows = if let Some(scope) = scope {
            stmt.query_map(rusqlite::params![blob, k as i64, scope], map_hit)
        } else {
            stmt.query_map(rusqlite::params![blob, k as i64], map_hit)
        }
        .map_err(|e| to_storage_err(e.to_string()))?;

        let mut hits = Vec::new();
        for row in rows {
            if let Ok(hit) = row {
                hits.push(hit);
            }
        }
        Ok(hits)
    }
}

fn map_hit(row: &rusqlite::Row<'_>) -> rusqlite::Result<AnnHit> {
    let id_str: String = row.get(0)?;
    let distance: f64 = row.get(1)?;
    let id = Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::nil());
    Ok(AnnHit { id, distance })
}

fn try_load(conn: &Connection, dimensions: usize) -> Result<(), String> {
    unsafe {
        conn.load_extension_enable()
            .map_err(|e| format!("failed to enable extension loading: {e}"))?;
        let result = conn.load_extension("vec0", None::<&str>);
        let _ = conn.load_extension_disable();
        result.map_err(|e| format!("vec0 extension unavailable: {e}"))?;
    }
    conn.execute_batch(&format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS vec_memories USING vec0(embedding float[{dimensions}]);"
    ))
    .map_err(|e| format!("failed to create vec_memories: {e}"))?;
    Ok(())
}

/// Pack an f32 slice into the little-endian byte layout `vec0` expects.
fn encode_vector(v: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(v.len() * 4);
    for x in v {
        bytes.extend_from_slice(&x.to_le_bytes());
    }
    bytes
}
