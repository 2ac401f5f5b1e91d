//! The persistent record type and its closed taxonomies.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Semantic category of a memory. Closed: `"auto"` is an input directive
/// handled by the engine, never a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Identity,
    Task,
    Knowledge,
    Reference,
    Note,
    Unclassified,
}

impl Kind {
    /// The five kinds a classifier may assign. `Unclassified` is never a
    /// classifier *target* — only a fallback output.
    pub const CLASSIFIABLE: [Kind; 5] = [
        Kind::Identity,
        Kind::Task,
        Kind::Knowledge,
        Kind::Reference,
        Kind::Note,
    ];

    /// All six variants, in enum order, for zero-filled aggregations.
    pub const ALL: [Kind; 6] = [
        Kind::Identity,
        Kind::Task,
        Kind::Knowledge,
        Kind::Reference,
        Kind::Note,
        Kind::Unclassified,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Identity => "identity",
            Kind::Task => "task",
            Kind::Knowledge => "knowledge",
            Kind::Reference => "reference",
            Kind::Note => "note",
            Kind::Unclassified => "unclassified",
        }
    }

    pub fn from_str_strict(s: &str) -> Option<Kind> {
        match s {
            "identity" => Some(Kind::Identity),
            "task" => Some(Kind::Task),
            "knowledge" => Some(Kind::Knowledge),
            "reference" => Some(Kind::Reference),
            "note" => Some(Kind::Note),
            "unclassified" => Some(Kind::Unclassified),
            _ => None,
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse retention domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Session,
    Project,
    Global,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Session => "session",
            Scope::Project => "project",
            Scope::Global => "global",
        }
    }

    pub fn from_str_strict(s: &str) -> Option<Scope> {
        match s {
            "session" => Some(Scope::Session),
            "project" => Some(Scope::Project),
            "global" => Some(Scope::Global),
            _ => None,
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::Global
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// D-dim unit-norm embedding. `D = 384` throughout this engine.
pub const EMBEDDING_DIM: usize = 384;

/// The persistent unit of storage. One `remember` call produces one or more
/// rows sharing a `parent_id`; a single-chunk call produces one row whose
/// `id == parent_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub chunk_index: u32,
    pub content: String,
    pub kind: Kind,
    pub scope: Scope,
    pub importance: f32,
    pub token_count: u32,
    pub recall_count: u32,
    pub last_recalled_at: Option<i64>,
    pub validity_score: f32,
    pub is_negative: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub embedding: Option<Vec<f32>>,
}

impl MemoryRecord {
    /// Build a fresh row for a brand-new chunk. `id == parent_id` unless the
    /// caller overwrites `parent_id` to link siblings from the same call.
    pub fn new_chunk(
        content: String,
        kind: Kind,
        scope: Scope,
        importance: f32,
        validity_score: f32,
        is_negative: bool,
        token_count: u32,
        embedding: Option<Vec<f32>>,
        now_ms: i64,
    ) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            parent_id: id,
            chunk_index: 0,
            content,
            kind,
            scope,
            importance: importance.clamp(0.0, 1.0),
            token_count,
            recall_count: 0,
            last_recalled_at: None,
            validity_score: validity_score.clamp(0.0, 1.0),
            is_negative,
            created_at: now_ms,
            updated_at: now_ms,
            embedding,
        }
    }
}

/// Lightweight summary used by `list` — deliberately excludes the embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySummary {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub chunk_index: u32,
    pub content: String,
    pub kind: Kind,
    pub scope: Scope,
    pub importance: f32,
    pub recall_count: u32,
    pub last_recalled_at: Option<i64>,
    pub validity_score: f32,
    pub is_negative: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&MemoryRecord> for MemorySummary {
    fn from(r: &MemoryRecord) -> Self {
        Self {
            id: r.id,
            parent_id: r.parent_id,
            chunk_index: r.chunk_index,
            content: r.content.clone(),
            kind: r.kind,
            scope: r.scope,
            importance: r.importance,
            recall_count: r.recall_count,
            last_recalled_at: r.last_recalled_at,
            validity_score: r.validity_score,
            is_negative: r.is_negative,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// `‖v‖₂ ≈ 1` check used to enforce invariant I4 at the boundary.
pub fn is_approximately_unit_norm(v: &[f32]) -> bool {
    let norm_sq: f32 = v.iter().map(|x| x * x).sum();
    (norm_sq.sqrt() - 1.0).abs() < 0.01
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for k in Kind::ALL {
            assert_eq!(Kind::from_str_strict(k.as_str()), Some(k));
        }
    }

    #[test]
    fn scope_round_trips_through_str() {
        for s in [Scope::Session, Scope::Project, Scope::Global] {
            assert_eq!(Scope::from_str_strict(s.as_str()), Some(s));
        }
    }

    #[test]
    fn unit_norm_detects_drift() {
        assert!(is_approximately_unit_norm(&[1.0, 0.0, 0.0]));
        assert!(!is_approximately_unit_norm(&[2.0, 0.0, 0.0]));
    }
}
