//! C6: picks a diverse top-K from scored candidates via Maximal Marginal
//! Relevance (λ = 0.75 by default).

use std::cmp::Ordering;

use ram_core::cosine;

use crate::scorer::ScoredCandidate;

/// Select `limit` items from `candidates` via MMR. If `candidates.len() <=
/// limit`, returns the input unchanged (order preserved). Otherwise greedily
/// picks, at each step, the candidate maximizing `lambda*score -
/// (1-lambda)*max_sim(candidate, already_selected)`; ties go to whichever
/// candidate sorts earlier by score. The final output is re-sorted by
/// `(score desc, updated_at desc, id asc)` for stable presentation.
pub fn mmr_select(candidates: Vec<ScoredCandidate>, limit: usize, lambda: f64) -> Vec<ScoredCandidate> {
    if candidates.len() <= limit {
        return candidates;
    }

    let mut remaining = candidates;
    remaining.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut selected: Vec<ScoredCandidate> = Vec::with_capacity(limit);
    while selected.len() < limit && !remaining.is_empty() {
        let mut best_idx = 0;
        let mut best_value = f64::NEG_INFINITY;
        for (i, candidate) in remaining.iter().enumerate() {
            let max_sim = selected
                .iter()
                .map(|s| max_embedding_sim(candidate, s))
                .fold(0.0_f64, f64::max);
            let value = lambda * candidate.score - (1.0 - lambda) * max_sim;
            if value > best_value {
                best_value = value;
                best_idx = i;
            }
        }
        selected.push(remaining.remove(best_idx));
    }

    sort_for_presentation(&mut selected);
    selected
}

fn max_embedding_sim(a: &ScoredCandidate, b: &ScoredCandidate) -> f64 {
    match (&a.record.embedding, &b.record.embedding) {
        (Some(ea), Some(eb)) => cosine(ea, eb) as f64,
        _ => 0.0,
    }
}

pub fn sort_for_presentation(items: &mut [ScoredCandidate]) {
    items.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.record.updated_at.cmp(&a.record.updated_at))
            .then_with(|| a.record.id.cmp(&b.record.id))
    });
}
