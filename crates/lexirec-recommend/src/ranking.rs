//! Cosine similarity and maximal marginal relevance selection.

use std::cmp::Ordering;

/// Floor for the cosine denominator; keeps degenerate all-zero vectors from
/// dividing by zero.
const COSINE_EPS: f32 = 1e-8;

/// Cosine similarity of two vectors. Mismatched lengths score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    dot / (norm_a * norm_b).max(COSINE_EPS)
}

/// Greedy maximal marginal relevance selection.
///
/// Picks up to `k` candidates maximizing
/// `lambda * sim(query, i) - (1 - lambda) * max_sim(i, selected)`,
/// then re-sorts the selected set by similarity to the query, so the returned
/// order reflects pure relevance even though the set was chosen for
/// diversity. Exact float ties go to the first candidate encountered; the
/// outcome is implementation-defined but deterministic for a given input
/// order.
pub fn mmr_select<T: Clone>(
    query: &[f32],
    candidates: &[(T, Vec<f32>)],
    k: usize,
    lambda: f32,
) -> Vec<(T, f32)> {
    let query_sims: Vec<f32> = candidates
        .iter()
        .map(|(_, v)| cosine_similarity(query, v))
        .collect();

    let mut remaining: Vec<usize> = (0..candidates.len()).collect();
    let mut selected: Vec<usize> = Vec::new();

    while !remaining.is_empty() && selected.len() < k {
        let mut best_pos = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (pos, &i) in remaining.iter().enumerate() {
            let max_sim_to_selected = selected
                .iter()
                .map(|&s| cosine_similarity(&candidates[i].1, &candidates[s].1))
                .fold(0.0f32, f32::max);

            let score = lambda * query_sims[i] - (1.0 - lambda) * max_sim_to_selected;
            if score > best_score {
                best_score = score;
                best_pos = pos;
            }
        }

        selected.push(remaining.remove(best_pos));
    }

    let mut out: Vec<(T, f32)> = selected
        .into_iter()
        .map(|i| (candidates[i].0.clone(), query_sims[i]))
        .collect();
    out.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    out
}
