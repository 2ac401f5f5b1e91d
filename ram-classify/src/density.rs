//! Converts a list of `(neighbor kind, ANN distance)` pairs into a per-kind
//! density score: `1 / (1 + max(0, distance))`, averaged within each kind
//! that appears among the neighbors.

use std::collections::HashMap;

use ram_core::Kind;

pub fn density_scores(neighbors: &[(Kind, f64)]) -> HashMap<Kind, f64> {
    let mut sums: HashMap<Kind, f64> = HashMap::new();
    let mut counts: HashMap<Kind, usize> = HashMap::new();

    for (kind, distance) in neighbors {
        let s = 1.0 / (1.0 + distance.max(0.0));
        *sums.entry(*kind).or_insert(0.0) += s;
        *counts.entry(*kind).or_insert(0) += 1;
    }

    sums.into_iter()
        .map(|(kind, sum)| {
            let n = counts[&kind] as f64;
            (kind, sum / n)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_neighbors_yields_empty_map() {
        assert!(density_scores(&[]).is_empty());
    }

    #[test]
    fn zero_distance_neighbor_scores_one() {
        let scores = density_scores(&[(Kind::Task, 0.0)]);
        assert_eq!(scores[&Kind::Task], 1.0);
    }

    #[test]
    fn averages_within_a_kind() {
        let scores = density_scores(&[(Kind::Task, 0.0), (Kind::Task, 1.0)]);
        // (1.0 + 0.5) / 2
        assert!((scores[&Kind::Task] - 0.75).abs() < 1e-9);
    }

    #[test]
    fn negative_distance_is_clamped_to_zero() {
        let scores = density_scores(&[(Kind::Note, -5.0)]);
        assert_eq!(scores[&Kind::Note], 1.0);
    }

    #[test]
    fn multiple_kinds_are_kept_separate() {
        let scores = density_scores(&[(Kind::Task, 0.0), (Kind::Reference, 0.0)]);
        assert_eq!(scores.len(), 2);
    }
}
