//! The public facade (C8). Owns the storage handle, the classifier, and the
//! process-wide query-embedding cache; orchestrates every other component
//! behind nine operations. One `Engine` per process, constructed explicitly
//! and passed around rather than reached for through global state.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use ram_classify::Classifier;
use ram_core::config::EngineConfig;
use ram_core::memory::{Kind, MemorySummary, Scope};
use ram_core::{chunk_text, Embedder, MemoryRecord, RamError, RamResult, Tokenizer};
use ram_retrieval::{expand_query, mmr_select, score_candidates, ScoredCandidate};
use ram_storage::rows::ListFilter as StorageListFilter;
use ram_storage::store::StorageStatus;
use ram_storage::{CountByKind, Storage};

use crate::cache::QueryEmbeddingCache;
use crate::context::build_context;
use crate::options::{BuildContextOptions, CountByKindOptions, ListOptions, RecallOptions, RememberOptions};

pub struct Engine {
    storage: Storage,
    embedder: Arc<dyn Embedder>,
    tokenizer: Arc<dyn Tokenizer>,
    classifier: Classifier,
    config: EngineConfig,
    query_cache: Mutex<QueryEmbeddingCache>,
}

/// One chunk's fate, decided during the embed/dedup-probe pass of
/// [`Engine::remember`] but not yet applied to the store.
enum PlannedChunk {
    Merge {
        target: Uuid,
        chunk_content: String,
        kind: Kind,
        embedding: Vec<f32>,
        token_count: u32,
    },
    New(MemoryRecord),
}

impl Engine {
    pub fn open(
        path: &Path,
        embedder: Arc<dyn Embedder>,
        tokenizer: Arc<dyn Tokenizer>,
        config: EngineConfig,
    ) -> RamResult<Self> {
        let dimensions = embedder.dimensions();
        let storage = Storage::open(path, &config.storage, dimensions)?;
        tracing::info!(path = %path.display(), "ram engine opened");
        Ok(Self::from_parts(storage, embedder, tokenizer, config))
    }

    pub fn open_in_memory(
        embedder: Arc<dyn Embedder>,
        tokenizer: Arc<dyn Tokenizer>,
        config: EngineConfig,
    ) -> RamResult<Self> {
        let dimensions = embedder.dimensions();
        let storage = Storage::open_in_memory(&config.storage, dimensions)?;
        tracing::info!("ram engine opened in-memory");
        Ok(Self::from_parts(storage, embedder, tokenizer, config))
    }

    fn from_parts(storage: Storage, embedder: Arc<dyn Embedder>, tokenizer: Arc<dyn Tokenizer>, config: EngineConfig) -> Self {
        let classifier = Classifier::new(Arc::clone(&embedder), config.classifier);
        let query_cache = Mutex::new(QueryEmbeddingCache::new(config.query_cache.capacity));
        Self {
            storage,
            embedder,
            tokenizer,
            classifier,
            config,
            query_cache,
        }
    }

    /// remember(content, options) — chunk, embed, dedup-probe, classify (if
    /// `kind` is absent), insert. Returns the first new row, or else the
    /// first merged row.
    ///
    /// Every chunk is embedded and dedup-probed (both read-only against the
    /// store) before any mutation is applied. Per §5, cancelling this future
    /// must never leave a partial write behind; the only way to guarantee
    /// that here is to defer every commit (merge or insert) until all chunk
    /// embeddings are already in hand, then apply them as a final batch.
    pub async fn remember(&self, content: &str, options: RememberOptions) -> RamResult<MemoryRecord> {
        if content.trim().is_empty() {
            return Err(RamError::EmptyContent);
        }

        let chunks = chunk_text(content, self.config.chunker, self.tokenizer.as_ref())?;
        if chunks.is_empty() {
            return Err(RamError::EmptyChunks);
        }

        let now = now_ms();
        let parent_id = Uuid::new_v4();
        let mut planned = Vec::with_capacity(chunks.len());

        for (idx, chunk) in chunks.iter().enumerate() {
            let embedding = self.embedder.embed(chunk)?;
            let token_count = self.tokenizer.count(chunk)? as u32;
            let kind = self.resolve_kind(options.kind, &embedding, options.scope)?;

            let duplicate = self
                .storage
                .find_semantic_duplicate(&embedding, options.scope, self.config.dedup.threshold, self.config.dedup.ann_probe_k)
                .await?;

            planned.push(match duplicate {
                Some(existing) => PlannedChunk::Merge {
                    target: existing.id,
                    chunk_content: chunk.clone(),
                    kind,
                    embedding,
                    token_count,
                },
                None => {
                    let mut record = MemoryRecord::new_chunk(
                        chunk.clone(),
                        kind,
                        options.scope,
                        options.importance,
                        options.validity_score,
                        options.is_negative,
                        token_count,
                        Some(embedding),
                        now,
                    );
                    record.parent_id = parent_id;
                    record.chunk_index = idx as u32;
                    PlannedChunk::New(record)
                }
            });
        }

        // Every chunk is embedded and probed; apply all mutations now.
        let mut new_rows = Vec::with_capacity(planned.len());
        let mut first_new: Option<MemoryRecord> = None;
        let mut first_merged: Option<MemoryRecord> = None;

        for item in planned {
            match item {
                PlannedChunk::Merge {
                    target,
                    chunk_content,
                    kind,
                    embedding,
                    token_count,
                } => {
                    let merged = self
                        .storage
                        .merge_into_existing(target, &chunk_content, kind, Some(&embedding), token_count, options.importance, now)
                        .await?;
                    tracing::debug!(id = %merged.id, "remember merged into existing row");
                    if first_merged.is_none() {
                        first_merged = Some(merged);
                    }
                }
                PlannedChunk::New(record) => {
                    if first_new.is_none() {
                        first_new = Some(record.clone());
                    }
                    new_rows.push(record);
                }
            }
        }

        if !new_rows.is_empty() {
            tracing::debug!(chunks = new_rows.len(), "remember inserting new rows");
            self.storage.insert_rows(&new_rows).await?;
        }

        first_new.or(first_merged).ok_or(RamError::EmptyChunks)
    }

    fn resolve_kind(&self, requested: Option<Kind>, embedding: &[f32], scope: Scope) -> RamResult<Kind> {
        match requested {
            Some(kind) => Ok(kind),
            None => {
                let neighbors = self.density_neighbors(embedding, scope)?;
                let decision = self.classifier.classify(embedding, &neighbors)?;
                tracing::debug!(kind = %decision.kind, confidence = decision.confidence, "classifier decision");
                Ok(decision.kind)
            }
        }
    }

    fn density_neighbors(&self, embedding: &[f32], scope: Scope) -> RamResult<Vec<(Kind, f64)>> {
        let hits = self
            .storage
            .ann_query(embedding, self.config.classifier.density_neighbors, Some(scope))?;
        if hits.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = hits.iter().map(|h| h.id).collect();
        let rows = self.storage.get_by_ids(&ids)?;
        Ok(hits.iter().filter_map(|h| rows.get(&h.id).map(|r| (r.kind, h.distance))).collect())
    }

    /// recall(query, options) — expand, embed, gather ANN+FTS candidates,
    /// score, MMR-select, expand siblings, re-rank, bump recall metrics.
    pub async fn recall(&self, query: &str, options: RecallOptions) -> RamResult<Vec<MemoryRecord>> {
        let scored = self.recall_scored(query, options).await?;
        Ok(scored.into_iter().map(|s| s.record).collect())
    }

    /// Same pipeline as [`Engine::recall`] but returns the full scored
    /// candidates (partial scores included) instead of bare records.
    pub async fn recall_scored(&self, query: &str, options: RecallOptions) -> RamResult<Vec<ScoredCandidate>> {
        if query.trim().is_empty() {
            return Err(RamError::EmptyQuery);
        }

        let limit = options.normalized_limit();
        let corpus_size = self.storage.corpus_size()?;
        let recall_limit = options.recall_limit.unwrap_or_else(|| dynamic_recall_width(corpus_size));
        let k = recall_limit.max(limit * 8);

        let mut expansions = expand_query(query);
        if expansions.is_empty() {
            expansions.push(query.trim().to_string());
        }

        let mut canonical_embedding: Option<Vec<f32>> = None;
        let mut candidate_ids: HashSet<Uuid> = HashSet::new();
        let mut fts_hit_ids: HashSet<Uuid> = HashSet::new();

        for (i, expansion) in expansions.iter().enumerate() {
            let embedding = self.embed_query_cached(expansion)?;
            if i == 0 {
                canonical_embedding = Some(embedding.clone());
            }
            for hit in self.storage.ann_query(&embedding, k, options.scope)? {
                candidate_ids.insert(hit.id);
            }
            for id in self.storage.fts_search(expansion, k)? {
                fts_hit_ids.insert(id);
                candidate_ids.insert(id);
            }
        }

        if candidate_ids.is_empty() {
            tracing::debug!(query, "recall found no candidates");
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = candidate_ids.into_iter().collect();
        let rows = self.storage.get_by_ids(&ids)?;
        let candidates: Vec<MemoryRecord> = rows.into_values().collect();
        tracing::debug!(candidates = candidates.len(), "recall gathered candidates");

        let now = now_ms();
        let mut scored = score_candidates(query, canonical_embedding.as_deref(), candidates, &fts_hit_ids, now, &self.config.scorer);
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(recall_limit);

        let selected = mmr_select(scored, limit, self.config.mmr.lambda);
        let with_siblings = self.expand_with_siblings(selected, query, canonical_embedding.as_deref(), &fts_hit_ids, now)?;
        let reranked = mmr_select(with_siblings, limit, self.config.mmr.lambda);

        let returned_ids: Vec<Uuid> = reranked.iter().map(|s| s.record.id).collect();
        self.storage
            .bump_recall_metrics(&returned_ids, self.config.recall_metrics.boost, now)
            .await?;

        Ok(reranked)
    }

    /// For each surviving item, pulls in not-yet-present chunks from the same
    /// parent within `sibling_expansion.window`, scored fresh and then
    /// decayed per §4.7 so they never outrank the match that pulled them in.
    fn expand_with_siblings(
        &self,
        selected: Vec<ScoredCandidate>,
        query: &str,
        query_embedding: Option<&[f32]>,
        fts_hit_ids: &HashSet<Uuid>,
        now_ms: i64,
    ) -> RamResult<Vec<ScoredCandidate>> {
        let cfg = &self.config.sibling_expansion;
        let mut present: HashSet<Uuid> = selected.iter().map(|s| s.record.id).collect();
        let mut extra = Vec::new();

        for item in &selected {
            let exclude: Vec<Uuid> = present.iter().copied().collect();
            let siblings = self
                .storage
                .get_siblings(item.record.parent_id, item.record.chunk_index, cfg.window, &exclude)?;
            for sibling in siblings {
                if !present.insert(sibling.id) {
                    continue;
                }
                let mut scored_sibling = score_candidates(query, query_embedding, vec![sibling], fts_hit_ids, now_ms, &self.config.scorer)
                    .remove(0);
                scored_sibling.vector_score = (scored_sibling.vector_score - cfg.vector_penalty).max(0.0);
                scored_sibling.lexical_score = (scored_sibling.lexical_score - cfg.lexical_penalty).max(0.0);
                scored_sibling.score = (scored_sibling.score - cfg.final_penalty).max(0.0);
                extra.push(scored_sibling);
            }
        }

        let mut combined = selected;
        combined.extend(extra);
        Ok(combined)
    }

    fn embed_query_cached(&self, text: &str) -> RamResult<Vec<f32>> {
        if let Some(cached) = self.query_cache.lock().get(text) {
            return Ok(cached);
        }
        let embedding = self.embedder.embed(text)?;
        self.query_cache.lock().put(text.to_string(), embedding.clone());
        Ok(embedding)
    }

    /// build-context(query, options) — recall at a wider width, group by
    /// parent, and render the bit-exact presentation format.
    pub async fn build_context(&self, query: &str, options: BuildContextOptions) -> RamResult<String> {
        let recall_limit = (6 * options.limit).max(30);
        let recall_options = RecallOptions {
            limit: options.limit,
            recall_limit: Some(recall_limit),
            scope: None,
        };
        let scored = self.recall_scored(query, recall_options).await?;
        Ok(build_context(&scored, options.max_chars))
    }

    /// forget(id) — idempotent delete from record table, ANN, and FTS.
    pub async fn forget(&self, id: Uuid) -> RamResult<()> {
        self.storage.forget(id).await
    }

    /// list(options) — paginated summaries, newest first.
    pub fn list(&self, options: ListOptions) -> RamResult<Vec<MemorySummary>> {
        let filter = StorageListFilter {
            scope: options.scope,
            kind: options.kind,
            query: options.query.clone(),
            limit: options.normalized_limit(),
            offset: options.offset,
        };
        self.storage.list(&filter)
    }

    /// open(id) — realized as `open_memory` since `Engine::open` already
    /// names the path-based constructor.
    pub fn open_memory(&self, id: Uuid) -> RamResult<Option<MemoryRecord>> {
        self.storage.get_by_id(id)
    }

    /// count-by-kind(options) — zero-filled map over every `Kind` value.
    pub fn count_by_kind(&self, options: CountByKindOptions) -> RamResult<CountByKind> {
        self.storage.count_by_kind(options.scope, options.query.as_deref())
    }

    /// mark-invalid(id, score) — floors score at 0, sets `isNegative=true`.
    pub async fn mark_invalid(&self, id: Uuid, score: f32) -> RamResult<bool> {
        self.storage.mark_invalid(id, score, now_ms()).await
    }

    /// status() — `{ path, ann: { enabled, message }, corpusSize }`, plus the
    /// ambient `fts_available` flag storage already tracks.
    pub fn status(&self) -> RamResult<StorageStatus> {
        self.storage.status()
    }
}

/// `corpus > 50000 → 200`, `corpus > 5000 → 100`, else `50`.
fn dynamic_recall_width(corpus_size: u64) -> usize {
    if corpus_size > 50_000 {
        200
    } else if corpus_size > 5_000 {
        100
    } else {
        50
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_recall_width_thresholds() {
        assert_eq!(dynamic_recall_width(0), 50);
        assert_eq!(dynamic_recall_width(5_001), 100);
        assert_eq!(dynamic_recall_width(50_001), 200);
    }
}
