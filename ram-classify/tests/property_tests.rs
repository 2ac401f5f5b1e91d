//! Property test for invariant 3 (classifier totality): for any embedding and
//! any neighbor set, `classify` always returns one of the six `Kind` values
//! with a confidence in `[0, 1]` — it never panics and never returns an
//! out-of-range score.

use std::sync::Arc;

use proptest::prelude::*;

use ram_classify::Classifier;
use ram_core::config::ClassifierConfig;
use ram_core::{Embedder, Kind, RamResult};

struct HashEmbedder;

impl Embedder for HashEmbedder {
    fn dimensions(&self) -> usize {
        4
    }

    fn embed(&self, text: &str) -> RamResult<Vec<f32>> {
        let mut bytes = [0u8; 4];
        for (i, b) in text.bytes().enumerate() {
            bytes[i % 4] ^= b;
        }
        let mut v: Vec<f32> = bytes.iter().map(|b| *b as f32 + 1.0).collect();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        for x in v.iter_mut() {
            *x /= norm;
        }
        Ok(v)
    }
}

fn arbitrary_kind(i: u8) -> Kind {
    Kind::ALL[(i as usize) % Kind::ALL.len()]
}

proptest! {
    #[test]
    fn classify_is_total_and_confidence_bounded(
        embedding in prop::collection::vec(-1.0f32..1.0, 0..8),
        neighbor_kinds in prop::collection::vec(0u8..6, 0..10),
        neighbor_distances in prop::collection::vec(0.0f64..5.0, 0..10),
    ) {
        let classifier = Classifier::new(Arc::new(HashEmbedder), ClassifierConfig::default());
        let neighbors: Vec<(Kind, f64)> = neighbor_kinds
            .into_iter()
            .map(arbitrary_kind)
            .zip(neighbor_distances.into_iter().chain(std::iter::repeat(0.0)))
            .collect();

        let result = classifier.classify(&embedding, &neighbors).unwrap();
        prop_assert!(Kind::ALL.contains(&result.kind));
        prop_assert!(result.confidence >= 0.0 && result.confidence <= 1.0 + 1e-6);
    }
}
