use crate::index::{SimilarityIndex, SparseVector};
use std::cmp::Ordering;

/// A ranked row and its cosine similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub score: f32,
}

fn by_score_then_position(a: &Neighbor, b: &Neighbor) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.position.cmp(&b.position))
}

/// Score every row against `query` and return the `top_n` best, highest first.
///
/// Equal scores are ordered by ascending row position. `exclude` is removed
/// before truncation, so it never costs the caller a slot.
pub fn rank(query: &SparseVector, index: &SimilarityIndex, top_n: usize, exclude: Option<usize>) -> Vec<Neighbor> {
    if top_n == 0 {
        return Vec::new();
    }
    let mut scored: Vec<Neighbor> = index
        .vectors()
        .iter()
        .enumerate()
        .filter(|(position, _)| Some(*position) != exclude)
        .map(|(position, v)| Neighbor { position, score: query.dot(v) })
        .collect();

    if scored.len() > top_n {
        scored.select_nth_unstable_by(top_n - 1, by_score_then_position);
        scored.truncate(top_n);
    }
    scored.sort_unstable_by(by_score_then_position);
    scored
}
