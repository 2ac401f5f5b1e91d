//! Row-level CRUD against the `memories` table: mapping to/from
//! [`MemoryRecord`], transactional inserts, recall-metric bumps, merge,
//! sibling fetch, listing, and aggregation.

use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use ram_core::memory::{Kind, MemorySummary, Scope};
use ram_core::{MemoryRecord, RamResult};

use crate::ann::AnnIndex;
use crate::fts;
use crate::to_storage_err;

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<MemoryRecord> {
    let id: String = row.get("id")?;
    let parent_id: String = row.get("parent_id")?;
    let kind: String = row.get("kind")?;
    let scope: String = row.get("scope")?;
    let is_negative: i64 = row.get("is_negative")?;
    let embedding_blob: Option<Vec<u8>> = row.get("embedding")?;

    Ok(MemoryRecord {
        id: Uuid::parse_str(&id).unwrap_or_else(|_| Uuid::nil()),
        parent_id: Uuid::parse_str(&parent_id).unwrap_or_else(|_| Uuid::nil()),
        chunk_index: row.get::<_, i64>("chunk_index")? as u32,
        content: row.get("content")?,
        kind: Kind::from_str_strict(&kind).unwrap_or(Kind::Unclassified),
        scope: Scope::from_str_strict(&scope).unwrap_or(Scope::Global),
        importance: row.get::<_, f64>("importance")? as f32,
        token_count: row.get::<_, i64>("token_count")? as u32,
        recall_count: row.get::<_, i64>("recall_count")? as u32,
        last_recalled_at: row.get("last_recalled_at")?,
        validity_score: row.get::<_, f64>("validity_score")? as f32,
        is_negative: is_negative != 0,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        embedding: embedding_blob.map(|b| decode_vector(&b)),
    })
}

fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
        .collect()
}

fn encode_vector(v: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(v.len() * 4);
    for x in v {
        bytes.extend_from_slice(&x.to_le_bytes());
    }
    bytes
}

const SELECT_COLUMNS: &str = "id, parent_id, chunk_index, content, kind, scope, importance,
     token_count, recall_count, last_recalled_at, validity_score, is_negative,
     created_at, updated_at, embedding";

/// Insert every row of `records` plus their ANN and FTS entries in one
/// transaction. Both indexes are best-effort: an ANN upsert or FTS insert
/// failure for an individual row is logged and skipped, never propagated —
/// only a primary-row insert failure aborts the transaction.
pub fn insert_rows(conn: &mut Connection, records: &[MemoryRecord], ann: &AnnIndex) -> RamResult<()> {
    let tx = conn.transaction().map_err(|e| to_storage_err(e.to_string()))?;
    for r in records {
        tx.execute(
            "INSERT INTO memories (
                id, parent_id, chunk_index, content, kind, scope, importance,
                token_count, recall_count, last_recalled_at, validity_score,
                is_negative, created_at, updated_at, embedding
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15)",
            rusqlite::params![
                r.id.to_string(),
                r.parent_id.to_string(),
                r.chunk_index as i64,
                r.content,
                r.kind.as_str(),
                r.scope.as_str(),
                r.importance as f64,
                r.token_count as i64,
                r.recall_count as i64,
                r.last_recalled_at,
                r.validity_score as f64,
                r.is_negative as i64,
                r.created_at,
                r.updated_at,
                r.embedding.as_ref().map(|v| encode_vector(v)),
            ],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
        let rowid = tx.last_insert_rowid();

        if let Some(emb) = &r.embedding {
            if let Err(e) = ann.upsert(&tx, r.id, r.scope.as_str(), emb) {
                tracing::warn!(id = %r.id, error = %e, "ann upsert failed for row, continuing");
            }
        }

        if let Err(e) = fts::insert_row(&tx, rowid, &r.content) {
            tracing::warn!(id = %r.id, error = %e, "fts insert failed for row, continuing");
        }
    }
    tx.commit().map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn get_by_id(conn: &Connection, id: Uuid) -> RamResult<Option<MemoryRecord>> {
    conn.query_row(
        &format!("SELECT {SELECT_COLUMNS} FROM memories WHERE id = ?1"),
        [id.to_string()],
        row_to_record,
    )
    .optional()
    .map_err(|e| to_storage_err(e.to_string()))
}

pub fn get_by_ids(conn: &Connection, ids: &[Uuid]) -> RamResult<HashMap<Uuid, MemoryRecord>> {
    let mut out = HashMap::with_capacity(ids.len());
    for id in ids {
        if let Some(r) = get_by_id(conn, *id)? {
            out.insert(*id, r);
        }
    }
    Ok(out)
}

/// Siblings of `parent_id` with `chunk_index` in `[idx - window, idx + window]`
/// excluding any id already in `exclude`.
pub fn get_siblings(
    conn: &Connection,
    parent_id: Uuid,
    idx: u32,
    window: i64,
    exclude: &[Uuid],
) -> RamResult<Vec<MemoryRecord>> {
    let lo = (idx as i64 - window).max(0);
    let hi = idx as i64 + window;
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM memories
             WHERE parent_id = ?1 AND chunk_index BETWEEN ?2 AND ?3
             ORDER BY chunk_index ASC"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(rusqlite::params![parent_id.to_string(), lo, hi], row_to_record)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        let rec = row.map_err(|e| to_storage_err(e.to_string()))?;
        if !exclude.contains(&rec.id) {
            out.push(rec);
        }
    }
    Ok(out)
}

/// Merge new content into an existing row. Content, kind, embedding,
/// token count are overwritten; importance and validity are blended per the
/// merge policy. Replaces the row's ANN vector and FTS entry, both
/// best-effort.
pub fn merge_into_existing(
    conn: &mut Connection,
    target: Uuid,
    new_content: &str,
    new_kind: Kind,
    new_embedding: Option<&[f32]>,
    new_token_count: u32,
    new_importance: f32,
    ann: &AnnIndex,
    now_ms: i64,
) -> RamResult<MemoryRecord> {
    let tx = conn.transaction().map_err(|e| to_storage_err(e.to_string()))?;
    let (old_importance, old_validity, scope, rowid, old_content): (f64, f64, String, i64, String) = tx
        .query_row(
            "SELECT importance, validity_score, scope, rowid, content FROM memories WHERE id = ?1",
            [target.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let blended_importance = (0.9 * old_importance + 0.1 * new_importance as f64).min(1.0);
    let blended_validity = (old_validity + 0.01).min(1.0);

    tx.execute(
        "UPDATE memories SET content = ?2, kind = ?3, embedding = ?4, token_count = ?5,
         importance = ?6, validity_score = ?7, updated_at = ?8 WHERE id = ?1",
        rusqlite::params![
            target.to_string(),
            new_content,
            new_kind.as_str(),
            new_embedding.map(encode_vector),
            new_token_count as i64,
            blended_importance,
            blended_validity,
            now_ms,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    if let Some(emb) = new_embedding {
        if let Err(e) = ann.upsert(&tx, target, &scope, emb) {
            tracing::warn!(id = %target, error = %e, "ann upsert failed during merge");
        }
    }

    if let Err(e) = fts::update_row(&tx, rowid, &old_content, new_content) {
        tracing::warn!(id = %target, error = %e, "fts update failed during merge");
    }

    tx.commit().map_err(|e| to_storage_err(e.to_string()))?;
    get_by_id(conn, target)?.ok_or_else(|| to_storage_err("merged row vanished"))
}

/// Bump recall metrics for every returned id in a single transaction.
pub fn bump_recall_metrics(conn: &mut Connection, ids: &[Uuid], boost: f32, now_ms: i64) -> RamResult<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let tx = conn.transaction().map_err(|e| to_storage_err(e.to_string()))?;
    for id in ids {
        tx.execute(
            "UPDATE memories SET
                recall_count = recall_count + 1,
                last_recalled_at = ?2,
                updated_at = ?2,
                importance = MIN(1.0, 0.98 * importance + ?3)
             WHERE id = ?1",
            rusqlite::params![id.to_string(), now_ms, boost as f64],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    tx.commit().map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn mark_invalid(conn: &mut Connection, id: Uuid, score: f32, now_ms: i64) -> RamResult<bool> {
    let changed = conn
        .execute(
            "UPDATE memories SET validity_score = ?2, is_negative = 1, updated_at = ?3 WHERE id = ?1",
            rusqlite::params![id.to_string(), score.max(0.0) as f64, now_ms],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(changed > 0)
}

/// Delete a row and its ANN and FTS entries. Idempotent — absent ids are not
/// an error.
pub fn forget(conn: &mut Connection, id: Uuid, ann: &AnnIndex) -> RamResult<()> {
    let tx = conn.transaction().map_err(|e| to_storage_err(e.to_string()))?;

    let existing: Option<(i64, String)> = tx
        .query_row(
            "SELECT rowid, content FROM memories WHERE id = ?1",
            [id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    if let Err(e) = ann.delete(&tx, id) {
        tracing::warn!(%id, error = %e, "ann delete failed during forget");
    }

    if let Some((rowid, content)) = existing {
        if let Err(e) = fts::delete_row(&tx, rowid, &content) {
            tracing::warn!(%id, error = %e, "fts delete failed during forget");
        }
    }

    tx.execute("DELETE FROM memories WHERE id = ?1", [id.to_string()])
        .map_err(|e| to_storage_err(e.to_string()))?;
    tx.commit().map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub scope: Option<Scope>,
    pub kind: Option<Kind>,
    pub query: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

pub fn list(conn: &Connection, filter: &ListFilter) -> RamResult<Vec<MemorySummary>> {
    let mut sql = String::from(
        "SELECT id, parent_id, chunk_index, content, kind, scope, importance,
                recall_count, last_recalled_at, validity_score, is_negative,
                created_at, updated_at
         FROM memories WHERE 1=1",
    );
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
    if let Some(scope) = filter.scope {
        sql.push_str(" AND scope = ?");
        params.push(Box::new(scope.as_str().to_string()));
    }
    if let Some(kind) = filter.kind {
        sql.push_str(" AND kind = ?");
        params.push(Box::new(kind.as_str().to_string()));
    }
    if let Some(q) = &filter.query {
        sql.push_str(" AND content LIKE ? ESCAPE '\\'");
        params.push(Box::new(format!("%{}%", like_escape(q))));
    }
    sql.push_str(" ORDER BY updated_at DESC LIMIT ? OFFSET ?");
    params.push(Box::new(filter.limit.clamp(1, 200) as i64));
    params.push(Box::new(filter.offset as i64));

    let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err(e.to_string()))?;
    let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|b| b.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            let id: String = row.get("id")?;
            let parent_id: String = row.get("parent_id")?;
            let kind: String = row.get("kind")?;
            let scope: String = row.get("scope")?;
            let is_negative: i64 = row.get("is_negative")?;
            Ok(MemorySummary {
                id: Uuid::parse_str(&id).unwrap_or_else(|_| Uuid::nil()),
                parent_id: Uuid::parse_str(&parent_id).unwrap_or_else(|_| Uuid::nil()),
                chunk_index: row.get::<_, i64>("chunk_index")? as u32,
                content: row.get("content")?,
                kind: Kind::from_str_strict(&kind).unwrap_or(Kind::Unclassified),
                scope: Scope::from_str_strict(&scope).unwrap_or(Scope::Global),
                importance: row.get::<_, f64>("importance")? as f32,
                recall_count: row.get::<_, i64>("recall_count")? as u32,
                last_recalled_at: row.get("last_recalled_at")?,
                validity_score: row.get::<_, f64>("validity_score")? as f32,
                is_negative: is_negative != 0,
                created_at: row.get("created_at")?,
                updated_at: row.get("updated_at")?,
            })
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| to_storage_err(e.to_string()))?);
    }
    Ok(out)
}

fn like_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

pub type CountByKind = HashMap<Kind, u64>;

pub fn count_by_kind(
    conn: &Connection,
    scope: Option<Scope>,
    query: Option<&str>,
) -> RamResult<CountByKind> {
    let mut counts: CountByKind = Kind::ALL.iter().map(|k| (*k, 0)).collect();

    let mut sql = String::from("SELECT kind, COUNT(*) FROM memories WHERE 1=1");
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
    if let Some(scope) = scope {
        sql.push_str(" AND scope = ?");
        params.push(Box::new(scope.as_str().to_string()));
    }
    if let Some(q) = query {
        sql.push_str(" AND content LIKE ? ESCAPE '\\'");
        params.push(Box::new(format!("%{}%", like_escape(q))));
    }
    sql.push_str(" GROUP BY kind");

    let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err(e.to_string()))?;
    let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|b| b.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    for row in rows {
        let (kind_str, count) = row.map_err(|e| to_storage_err(e.to_string()))?;
        if let Some(kind) = Kind::from_str_strict(&kind_str) {
            counts.insert(kind, count as u64);
        }
    }
    Ok(counts)
}

pub fn corpus_size(conn: &Connection) -> RamResult<u64> {
    conn.query_row("SELECT COUNT(*) FROM memories", [], |row| row.get::<_, i64>(0))
        .map(|n| n as u64)
        .map_err(|e| to_storage_err(e.to_string()))
}

/// All non-null embeddings, used to rebuild the ANN index at startup.
pub fn all_embeddings(conn: &Connection) -> RamResult<Vec<(Uuid, String, Vec<f32>)>> {
    let mut stmt = conn
        .prepare("SELECT id, scope, embedding FROM memories WHERE embedding IS NOT NULL")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            let id: String = row.get(0)?;
            let scope: String = row.get(1)?;
            let blob: Vec<u8> = row.get(2)?;
            Ok((id, scope, blob))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut out = Vec::new();
    for row in rows {
        let (id, scope, blob) = row.map_err(|e| to_storage_err(e.to_string()))?;
        if let Ok(id) = Uuid::parse_str(&id) {
            out.push((id, scope, decode_vector(&blob)));
        }
    }
    Ok(out)
}
