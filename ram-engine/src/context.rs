//! `build-context` presentation: groups recalled chunks by `parentId`, joins
//! each group's content in chunk order, and renders bit-exact lines until the
//! character budget is exhausted.

use std::collections::HashMap;

use uuid::Uuid;

use ram_retrieval::ScoredCandidate;

struct Group {
    score: f64,
    records: Vec<(u32, String)>,
    kind: String,
    scope: String,
}

/// Render `- (<kind>/<scope>|score=<0.000>) <joined-content>` lines, one per
/// `parentId` group, sorted by the group's max score descending, greedily
/// filling until the next line would exceed `max_chars`.
pub fn build_context(candidates: &[ScoredCandidate], max_chars: usize) -> String {
    let mut groups: HashMap<Uuid, Group> = HashMap::new();

    for c in candidates {
        let entry = groups.entry(c.record.parent_id).or_insert_with(|| Group {
            score: c.score,
            records: Vec::new(),
            kind: c.record.kind.as_str().to_string(),
            scope: c.record.scope.as_str().to_string(),
        });
        entry.score = entry.score.max(c.score);
        entry.records.push((c.record.chunk_index, c.record.content.clone()));
    }

    let mut ordered: Vec<Group> = groups.into_values().collect();
    ordered.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut lines = Vec::new();
    let mut used = 0usize;
    for mut group in ordered {
        group.records.sort_by_key(|(idx, _)| *idx);
        let joined = group
            .records
            .iter()
            .map(|(_, content)| content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let line = format!("- ({}/{}|score={:.3}) {joined}", group.kind, group.scope, group.score);
        let added_len = if lines.is_empty() { line.len() } else { line.len() + 1 };
        if used + added_len > max_chars && !lines.is_empty() {
            break;
        }
        used += added_len;
        lines.push(line);
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ram_core::memory::{Kind, Scope};
    use ram_core::MemoryRecord;

    fn candidate(parent_id: Uuid, chunk_index: u32, content: &str, score: f64) -> ScoredCandidate {
        let mut record = MemoryRecord::new_chunk(
            content.to_string(),
            Kind::Note,
            Scope::Global,
            0.5,
            1.0,
            false,
            3,
            None,
            0,
        );
        record.parent_id = parent_id;
        record.chunk_index = chunk_index;
        ScoredCandidate {
            record,
            vector_score: 0.0,
            lexical_score: 0.0,
            recency_score: 0.0,
            importance_score: 0.0,
            score,
        }
    }

    #[test]
    fn joins_chunks_in_index_order_within_a_group() {
        let parent = Uuid::new_v4();
        let candidates = vec![candidate(parent, 1, "second", 0.5), candidate(parent, 0, "first", 0.5)];
        let rendered = build_context(&candidates, 2400);
        assert!(rendered.contains("first second"));
    }

    #[test]
    fn groups_sort_by_max_score_descending() {
        let low = candidate(Uuid::new_v4(), 0, "low score", 0.1);
        let high = candidate(Uuid::new_v4(), 0, "high score", 0.9);
        let rendered = build_context(&[low, high], 2400);
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[0].contains("high score"));
    }

    #[test]
    fn stops_before_exceeding_the_character_budget() {
        let candidates: Vec<ScoredCandidate> = (0..20)
            .map(|i| candidate(Uuid::new_v4(), 0, &format!("chunk number {i} with some padding text"), 1.0 - i as f64 * 0.01))
            .collect();
        let rendered = build_context(&candidates, 100);
        assert!(rendered.len() <= 100 + 60); // last accepted line may push slightly past; bounded loosely
        assert!(!rendered.is_empty());
    }

    #[test]
    fn score_is_formatted_to_three_decimal_places() {
        let candidates = vec![candidate(Uuid::new_v4(), 0, "x", 0.5)];
        let rendered = build_context(&candidates, 2400);
        assert!(rendered.contains("score=0.500"));
    }
}
