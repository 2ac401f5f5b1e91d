//! C5: combines vector/lexical/recency/importance/validity signals into a
//! single score per candidate.

use std::collections::HashSet;

use uuid::Uuid;

use ram_core::config::ScorerConfig;
use ram_core::cosine;
use ram_core::MemoryRecord;

use crate::expansion::tokenize;

/// A candidate record plus its five partial scores and the combined final
/// score — callers sort/truncate/rerank on `score`, but keep the partials
/// around for sibling-expansion decay (§4.7) and debugging.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub record: MemoryRecord,
    pub vector_score: f64,
    pub lexical_score: f64,
    pub recency_score: f64,
    pub importance_score: f64,
    pub score: f64,
}

const MS_PER_HOUR: f64 = 3_600_000.0;
const MS_PER_DAY: f64 = 86_400_000.0;

/// Score every candidate against `query`/`query_embedding`. `fts_hit_ids`
/// marks which candidates matched the lexical index (not just the token
/// overlap heuristic) — those get the FTS bonus in the lexical signal.
pub fn score_candidates(
    query: &str,
    query_embedding: Option<&[f32]>,
    candidates: Vec<MemoryRecord>,
    fts_hit_ids: &HashSet<Uuid>,
    now_ms: i64,
    config: &ScorerConfig,
) -> Vec<ScoredCandidate> {
    let query_tokens: HashSet<String> = tokenize(query).into_iter().collect();
    let query_lower = query.to_lowercase();

    candidates
        .into_iter()
        .map(|record| {
            score_one(
                &record,
                query_embedding,
                &query_tokens,
                &query_lower,
                fts_hit_ids,
                now_ms,
                config,
            )
        })
        .collect()
}

fn score_one(
    record: &MemoryRecord,
    query_embedding: Option<&[f32]>,
    query_tokens: &HashSet<String>,
    query_lower: &str,
    fts_hit_ids: &HashSet<Uuid>,
    now_ms: i64,
    config: &ScorerConfig,
) -> ScoredCandidate {
    let vector_score = match (query_embedding, &record.embedding) {
        (Some(q), Some(e)) => cosine(q, e).max(0.0) as f64,
        _ => 0.0,
    };

    let content_tokens: HashSet<String> = tokenize(&record.content).into_iter().collect();
    let overlap = if query_tokens.is_empty() {
        0.0
    } else {
        query_tokens.intersection(&content_tokens).count() as f64 / query_tokens.len() as f64
    };
    let mut lexical = overlap;
    if record.content.to_lowercase().contains(query_lower) && !query_lower.is_empty() {
        lexical += config.substring_bonus;
    }
    lexical = lexical.min(1.0);
    let lexical_score = if fts_hit_ids.contains(&record.id) {
        (lexical + config.fts_bonus).min(1.0)
    } else {
        lexical
    };

    let age_ms = (now_ms - record.updated_at).max(0) as f64;
    let age_hours = age_ms / MS_PER_HOUR;
    let recency_score = (24.0 / age_hours.max(1.0)).min(1.0);

    let age_days = age_ms / MS_PER_DAY;
    let importance_score = record.importance.clamp(0.0, 1.0) as f64 * 0.99f64.powf(age_days);

    let base = config.vector_weight * vector_score
        + config.lexical_weight * lexical_score
        + config.importance_weight * importance_score
        + config.recency_weight * recency_score;

    let validity = record.validity_score.clamp(0.0, 1.0) as f64;
    let penalty = if record.is_negative { config.negative_penalty } else { 0.0 };
    let score = (base * validity - penalty).max(0.0);

    ScoredCandidate {
        record: record.clone(),
        vector_score,
        lexical_score,
        recency_score,
        importance_score,
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ram_core::memory::{Kind, Scope};

    fn base_record(importance: f32, validity: f32, is_negative: bool, updated_at: i64) -> MemoryRecord {
        let mut rec = MemoryRecord::new_chunk(
            "the quick brown fox".to_string(),
            Kind::Note,
            Scope::Global,
            importance,
            validity,
            is_negative,
            4,
            Some(vec![1.0, 0.0, 0.0]),
            updated_at,
        );
        rec.updated_at = updated_at;
        rec
    }

    #[test]
    fn increasing_validity_never_decreases_score() {
        let config = ScorerConfig::default();
        let fts = HashSet::new();
        let low = base_record(0.5, 0.3, false, 0);
        let high = base_record(0.5, 0.9, false, 0);
        let scored_low = score_candidates("fox", Some(&[1.0, 0.0, 0.0]), vec![low], &fts, 0, &config);
        let scored_high = score_candidates("fox", Some(&[1.0, 0.0, 0.0]), vec![high], &fts, 0, &config);
        assert!(scored_high[0].score >= scored_low[0].score);
    }

    #[test]
    fn negative_flag_subtracts_exact_penalty_floored_at_zero() {
        let config = ScorerConfig::default();
        let fts = HashSet::new();
        let positive = base_record(0.5, 1.0, false, 0);
        let negative = base_record(0.5, 1.0, true, 0);
        let scored_pos = score_candidates("fox", Some(&[1.0, 0.0, 0.0]), vec![positive], &fts, 0, &config);
        let scored_neg = score_candidates("fox", Some(&[1.0, 0.0, 0.0]), vec![negative], &fts, 0, &config);
        let expected = (scored_pos[0].score - config.negative_penalty).max(0.0);
        assert!((scored_neg[0].score - expected).abs() < 1e-9);
    }

    #[test]
    fn fts_hit_adds_bonus_to_lexical_score() {
        // "lion" shares no tokens with "the quick brown fox" and isn't a
        // substring, so the lexical score without FTS is exactly 0 — any
        // gap from the FTS bonus is unambiguous (not masked by clamping).
        let config = ScorerConfig::default();
        let rec = base_record(0.5, 1.0, false, 0);
        let id = rec.id;
        let mut fts = HashSet::new();
        fts.insert(id);
        let without = score_candidates("lion", None, vec![rec.clone()], &HashSet::new(), 0, &config);
        let with = score_candidates("lion", None, vec![rec], &fts, 0, &config);
        assert_eq!(without[0].lexical_score, 0.0);
        assert!((with[0].lexical_score - config.fts_bonus).abs() < 1e-9);
    }

    #[test]
    fn no_embeddings_yields_zero_vector_score() {
        let config = ScorerConfig::default();
        let mut rec = base_record(0.5, 1.0, false, 0);
        rec.embedding = None;
        let scored = score_candidates("fox", Some(&[1.0, 0.0, 0.0]), vec![rec], &HashSet::new(), 0, &config);
        assert_eq!(scored[0].vector_score, 0.0);
    }
}
