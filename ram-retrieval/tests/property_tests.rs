//! Property tests for the two invariants in §8 that this crate owns:
//! MMR's size contract (5) and score monotonicity in validity (4).

use std::collections::HashSet;

use proptest::prelude::*;

use ram_core::config::ScorerConfig;
use ram_core::memory::{Kind, Scope};
use ram_core::MemoryRecord;
use ram_retrieval::{mmr_select, score_candidates, ScoredCandidate};

fn arbitrary_scored(score: f64, embedding: Option<Vec<f32>>) -> ScoredCandidate {
    let record = MemoryRecord::new_chunk(
        "content".to_string(),
        Kind::Note,
        Scope::Global,
        0.5,
        1.0,
        false,
        1,
        embedding,
        0,
    );
    ScoredCandidate {
        record,
        vector_score: 0.0,
        lexical_score: 0.0,
        recency_score: 0.0,
        importance_score: 0.0,
        score,
    }
}

proptest! {
    /// MMR size contract: output length = min(limit, input length); all
    /// output ids are distinct and a subset of the input ids.
    #[test]
    fn mmr_size_contract(
        scores in prop::collection::vec(0.0f64..1.0, 1..20),
        limit in 1usize..10,
    ) {
        let candidates: Vec<ScoredCandidate> = scores
            .into_iter()
            .enumerate()
            .map(|(i, s)| {
                let angle = i as f32;
                arbitrary_scored(s, Some(vec![angle.sin(), angle.cos(), 0.0]))
            })
            .collect();
        let input_ids: HashSet<_> = candidates.iter().map(|c| c.record.id).collect();
        let input_len = candidates.len();

        let selected = mmr_select(candidates, limit, 0.75);

        prop_assert_eq!(selected.len(), limit.min(input_len));
        let output_ids: HashSet<_> = selected.iter().map(|c| c.record.id).collect();
        prop_assert_eq!(output_ids.len(), selected.len());
        prop_assert!(output_ids.is_subset(&input_ids));
    }

    /// Score monotonicity: holding everything else equal, increasing
    /// validity_score cannot decrease the final score.
    #[test]
    fn score_monotone_in_validity(
        importance in 0.0f32..1.0,
        low_validity in 0.0f32..1.0,
        delta in 0.0f32..1.0,
    ) {
        let high_validity = (low_validity + delta).min(1.0);
        let config = ScorerConfig::default();

        let mut low = MemoryRecord::new_chunk(
            "match content".to_string(), Kind::Note, Scope::Global,
            importance, low_validity, false, 2, Some(vec![1.0, 0.0]), 0,
        );
        low.updated_at = 0;
        let mut high = low.clone();
        high.validity_score = high_validity;

        let scored_low = score_candidates("match", Some(&[1.0, 0.0]), vec![low], &HashSet::new(), 0, &config);
        let scored_high = score_candidates("match", Some(&[1.0, 0.0]), vec![high], &HashSet::new(), 0, &config);

        prop_assert!(scored_high[0].score >= scored_low[0].score - 1e-9);
    }
}
