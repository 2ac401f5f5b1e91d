//! `Storage` — the facade the engine holds for process lifetime. Owns the
//! connection pool, the ANN index, and the FTS availability flag; runs
//! migrations and rebuilds the ANN index from stored embeddings at open.

use std::path::Path;

use rusqlite::Connection;
use uuid::Uuid;

use ram_core::config::StorageConfig;
use ram_core::memory::{Kind, MemorySummary, Scope};
use ram_core::{MemoryRecord, RamResult};

use crate::ann::{AnnHit, AnnIndex, AnnStatus};
use crate::dedup;
use crate::fts;
use crate::migrations;
use crate::pool::ConnectionPool;
use crate::rows::{self, CountByKind, ListFilter};

/// Read-only snapshot returned by `status()`.
#[derive(Debug, Clone)]
pub struct StorageStatus {
    pub path: String,
    pub ann_enabled: bool,
    pub ann_message: String,
    pub fts_available: bool,
    pub corpus_size: u64,
}

pub struct Storage {
    pool: ConnectionPool,
    ann: AnnIndex,
    fts_available: bool,
    path_display: String,
    /// In-memory read-pool connections are isolated databases from the
    /// writer, so in-memory mode routes reads through the writer instead.
    use_read_pool: bool,
}

impl Storage {
    pub fn open(path: &Path, config: &StorageConfig, dimensions: usize) -> RamResult<Self> {
        let pool = ConnectionPool::open(path, config)?;
        let (ann, fts_available) = initialize(&pool, dimensions)?;
        Ok(Self {
            pool,
            ann,
            fts_available,
            path_display: path.display().to_string(),
            use_read_pool: true,
        })
    }

    pub fn open_in_memory(config: &StorageConfig, dimensions: usize) -> RamResult<Self> {
        let pool = ConnectionPool::open_in_memory(config)?;
        let (ann, fts_available) = initialize(&pool, dimensions)?;
        Ok(Self {
            pool,
            ann,
            fts_available,
            path_display: ":memory:".to_string(),
            use_read_pool: false,
        })
    }

    fn with_reader<F, T>(&self, f: F) -> RamResult<T>
    where
        F: FnOnce(&Connection) -> RamResult<T>,
    {
        if self.use_read_pool {
            self.pool.readers.with_conn(f)
        } else {
            self.pool.writer.with_conn_sync(|conn| f(conn))
        }
    }

    // --- writes ---

    /// Insert every new row of a `remember` call in one transaction.
    pub async fn insert_rows(&self, records: &[MemoryRecord]) -> RamResult<()> {
        let ann = &self.ann;
        self.pool
            .writer
            .with_conn(move |conn| rows::insert_rows(conn, records, ann))
            .await
    }

    pub async fn merge_into_existing(
        &self,
        target: Uuid,
        new_content: &str,
        new_kind: Kind,
        new_embedding: Option<&[f32]>,
        new_token_count: u32,
        new_importance: f32,
        now_ms: i64,
    ) -> RamResult<MemoryRecord> {
        let ann = &self.ann;
        self.pool
            .writer
            .with_conn(move |conn| {
                rows::merge_into_existing(
                    conn,
                    target,
                    new_content,
                    new_kind,
                    new_embedding,
                    new_token_count,
                    new_importance,
                    ann,
                    now_ms,
                )
            })
            .await
    }

    pub async fn bump_recall_metrics(&self, ids: &[Uuid], boost: f32, now_ms: i64) -> RamResult<()> {
        self.pool
            .writer
            .with_conn(move |conn| rows::bump_recall_metrics(conn, ids, boost, now_ms))
            .await
    }

    pub async fn mark_invalid(&self, id: Uuid, score: f32, now_ms: i64) -> RamResult<bool> {
        self.pool
            .writer
            .with_conn(move |conn| rows::mark_invalid(conn, id, score, now_ms))
            .await
    }

    /// Idempotent: absent ids are not an error.
    pub async fn forget(&self, id: Uuid) -> RamResult<()> {
        let ann = &self.ann;
        self.pool
            .writer
            .with_conn(move |conn| rows::forget(conn, id, ann))
            .await
    }

    /// Probe for a near-duplicate of `embedding` within `scope`. Runs on the
    /// writer connection (not the read pool) so a probe immediately after a
    /// sibling write in the same process sees it; this is still a plain read,
    /// not a transaction, so concurrent writers are not blocked by it.
    pub async fn find_semantic_duplicate(
        &self,
        embedding: &[f32],
        scope: Scope,
        threshold: f32,
        probe_k: usize,
    ) -> RamResult<Option<MemoryRecord>> {
        let ann = &self.ann;
        let embedding = embedding.to_vec();
        self.pool
            .writer
            .with_conn(move |conn| {
                dedup::find_semantic_duplicate(conn, ann, &embedding, scope, threshold, probe_k)
            })
            .await
    }

    // --- reads ---

    pub fn get_by_id(&self, id: Uuid) -> RamResult<Option<MemoryRecord>> {
        self.with_reader(|conn| rows::get_by_id(conn, id))
    }

    pub fn get_by_ids(&self, ids: &[Uuid]) -> RamResult<std::collections::HashMap<Uuid, MemoryRecord>> {
        self.with_reader(|conn| rows::get_by_ids(conn, ids))
    }

    pub fn get_siblings(
        &self,
        parent_id: Uuid,
        idx: u32,
        window: i64,
        exclude: &[Uuid],
    ) -> RamResult<Vec<MemoryRecord>> {
        self.with_reader(|conn| rows::get_siblings(conn, parent_id, idx, window, exclude))
    }

    pub fn list(&self, filter: &ListFilter) -> RamResult<Vec<MemorySummary>> {
        self.with_reader(|conn| rows::list(conn, filter))
    }

    pub fn count_by_kind(&self, scope: Option<Scope>, query: Option<&str>) -> RamResult<CountByKind> {
        self.with_reader(|conn| rows::count_by_kind(conn, scope, query))
    }

    pub fn corpus_size(&self) -> RamResult<u64> {
        self.with_reader(rows::corpus_size)
    }

    /// ANN k-NN query. Empty when the index is disabled.
    pub fn ann_query(&self, embedding: &[f32], k: usize, scope: Option<Scope>) -> RamResult<Vec<AnnHit>> {
        self.with_reader(|conn| self.ann.query(conn, embedding, k, scope.map(|s| s.as_str())))
    }

    /// FTS lexical query. Empty when the index is unavailable.
    pub fn fts_search(&self, query: &str, k: usize) -> RamResult<Vec<Uuid>> {
        self.with_reader(|conn| fts::search(conn, query, k))
    }

    pub fn ann_status(&self) -> &AnnStatus {
        self.ann.status()
    }

    pub fn fts_available(&self) -> bool {
        self.fts_available
    }

    pub fn status(&self) -> RamResult<StorageStatus> {
        Ok(StorageStatus {
            path: self.path_display.clone(),
            ann_enabled: self.ann.status().enabled(),
            ann_message: self.ann.status().message(),
            fts_available: self.fts_available,
            corpus_size: self.corpus_size()?,
        })
    }
}

fn initialize(pool: &ConnectionPool, dimensions: usize) -> RamResult<(AnnIndex, bool)> {
    pool.writer.with_conn_sync(|conn| {
        let report = migrations::run(conn)?;
        let ann = AnnIndex::load(conn, dimensions);
        if ann.status().enabled() {
            rebuild_ann(conn, &ann)?;
        }
        Ok((ann, report.fts_available))
    })
}

/// Re-populate the ANN index from every stored embedding. Runs once at open
/// since the ANN virtual table is not itself persistent across process
/// restarts the way the record table is.
fn rebuild_ann(conn: &Connection, ann: &AnnIndex) -> RamResult<()> {
    let mut rebuilt = 0usize;
    for (id, scope, embedding) in rows::all_embeddings(conn)? {
        match ann.upsert(conn, id, &scope, &embedding) {
            Ok(()) => rebuilt += 1,
            Err(e) => tracing::warn!(%id, error = %e, "failed to rebuild ann entry"),
        }
    }
    tracing::info!(rebuilt, "ann index rebuilt from stored embeddings");
    Ok(())
}
