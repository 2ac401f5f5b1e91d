//! # ram-classify
//!
//! C7: assigns a [`Kind`] to a freshly-embedded memory with a confidence
//! score, combining a static hand-written prototype table, a per-process
//! online-learned prototype cache, and ANN-neighbor density. No storage
//! access lives here — the caller (ram-engine) supplies the embedding and the
//! already-fetched neighbor `(Kind, distance)` pairs.

mod density;
mod prototypes;

pub use density::density_scores;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use ram_core::config::ClassifierConfig;
use ram_core::cosine;
use ram_core::{Embedder, Kind, RamResult};

/// Outcome of a classification call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub kind: Kind,
    pub confidence: f64,
}

type PrototypeMap = HashMap<Kind, Vec<Vec<f32>>>;

/// Holds the embedded static prototypes (lazily built, cached for the life of
/// the process) and the bounded per-kind learned-prototype queues.
pub struct Classifier {
    embedder: Arc<dyn Embedder>,
    config: ClassifierConfig,
    static_prototypes: Mutex<Option<Arc<PrototypeMap>>>,
    learned: Mutex<HashMap<Kind, std::collections::VecDeque<Vec<f32>>>>,
}

impl Classifier {
    pub fn new(embedder: Arc<dyn Embedder>, config: ClassifierConfig) -> Self {
        Self {
            embedder,
            config,
            static_prototypes: Mutex::new(None),
            learned: Mutex::new(HashMap::new()),
        }
    }

    /// Classify `embedding`, given up to `density_neighbors` ANN neighbors
    /// already resolved to `(kind, distance)` pairs. Empty embeddings are a
    /// fast path: `Unclassified` at confidence 0, no prototype lookup.
    pub fn classify(&self, embedding: &[f32], neighbors: &[(Kind, f64)]) -> RamResult<Classification> {
        if embedding.is_empty() {
            return Ok(Classification {
                kind: Kind::Unclassified,
                confidence: 0.0,
            });
        }

        let protos = self.static_prototypes()?;
        let proto_scores = self.prototype_scores(embedding, &protos);

        let mut by_score: Vec<(Kind, f64)> = proto_scores.clone();
        by_score.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let (top_kind, top_score) = by_score[0];
        let second_score = by_score.get(1).map(|(_, s)| *s).unwrap_or(0.0);

        if top_score >= self.config.prototype_top_threshold
            && (top_score - second_score) >= self.config.prototype_top_margin
        {
            self.maybe_learn(top_kind, top_score, embedding);
            return Ok(Classification {
                kind: top_kind,
                confidence: top_score,
            });
        }

        let density = density::density_scores(neighbors);
        let mut combined: Vec<(Kind, f64)> = Kind::CLASSIFIABLE
            .iter()
            .map(|&kind| {
                let proto = proto_scores.iter().find(|(k, _)| *k == kind).map(|(_, s)| *s).unwrap_or(0.0);
                let dens = density.get(&kind).copied().unwrap_or(0.0);
                let gated = if proto >= self.config.proto_gate_threshold {
                    dens
                } else {
                    self.config.proto_gate_discount * dens
                };
                let score = self.config.combined_proto_weight * proto + self.config.combined_density_weight * gated;
                (kind, score)
            })
            .collect();

        // `fold` keeps the earliest (enum-order) winner on exact ties, since
        // replacement requires strictly greater.
        let winner = combined.remove(0);
        let (winner_kind, confidence) = combined.into_iter().fold(winner, |best, cur| if cur.1 > best.1 { cur } else { best });

        self.maybe_learn(winner_kind, confidence, embedding);

        if confidence < self.config.confidence_floor {
            return Ok(Classification {
                kind: Kind::Unclassified,
                confidence,
            });
        }

        Ok(Classification {
            kind: winner_kind,
            confidence,
        })
    }

    fn prototype_scores(&self, embedding: &[f32], protos: &PrototypeMap) -> Vec<(Kind, f64)> {
        let learned = self.learned.lock();
        Kind::CLASSIFIABLE
            .iter()
            .map(|&kind| {
                let mut best = 0.0f32;
                if let Some(v) = protos.get(&kind) {
                    for p in v {
                        best = best.max(cosine(embedding, p).max(0.0));
                    }
                }
                if let Some(v) = learned.get(&kind) {
                    for p in v {
                        best = best.max(cosine(embedding, p).max(0.0));
                    }
                }
                (kind, best as f64)
            })
            .collect()
    }

    fn maybe_learn(&self, kind: Kind, confidence: f64, embedding: &[f32]) {
        if confidence <= self.config.learn_threshold {
            return;
        }
        let mut learned = self.learned.lock();
        let queue = learned.entry(kind).or_default();
        if queue.len() >= self.config.learned_capacity {
            queue.pop_front();
        }
        queue.push_back(embedding.to_vec());
        tracing::debug!(kind = %kind, queue_len = queue.len(), "learned a new prototype");
    }

    /// Embeds the static prototype table on first call and caches the result
    /// for the lifetime of this `Classifier`.
    fn static_prototypes(&self) -> RamResult<Arc<PrototypeMap>> {
        {
            let guard = self.static_prototypes.lock();
            if let Some(map) = guard.as_ref() {
                return Ok(Arc::clone(map));
            }
        }

        let mut map = PrototypeMap::new();
        for &kind in &Kind::CLASSIFIABLE {
            let exemplars = prototypes::exemplars(kind);
            let mut embedded = Vec::with_capacity(exemplars.len());
            for text in exemplars {
                embedded.push(self.embedder.embed(text)?);
            }
            map.insert(kind, embedded);
        }
        let map = Arc::new(map);

        let mut guard = self.static_prototypes.lock();
        *guard = Some(Arc::clone(&map));
        Ok(map)
    }
}
