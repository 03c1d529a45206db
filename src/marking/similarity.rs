//! Vector normalization and cosine similarity.

/// Returns `v / ||v||₂`, or `None` for a zero-norm (degenerate) vector.
pub fn l2_normalize(v: &[f32]) -> Option<Vec<f32>> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }
    Some(v.iter().map(|x| x / norm).collect())
}

/// Dot product of two already-normalized vectors, clamped to `[-1, 1]`.
///
/// Mismatched lengths score 0.0.
pub fn normalized_dot(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot.clamp(-1.0, 1.0)
}

/// Cosine similarity of two raw vectors; 0.0 if either is degenerate.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    match (l2_normalize(a), l2_normalize(b)) {
        (Some(a), Some(b)) => normalized_dot(&a, &b),
        _ => 0.0,
    }
}

/// Similarity of one normalized answer against every normalized point.
///
/// A pair involving a degenerate vector (`None`) has no similarity.
pub fn similarity_vector(
    answer: Option<&[f32]>,
    points: &[Option<Vec<f32>>],
) -> Vec<Option<f32>> {
    points
        .iter()
        .map(|point| match (answer, point) {
            (Some(a), Some(p)) => Some(normalized_dot(a, p)),
            _ => None,
        })
        .collect()
}

/// Indices whose similarity is at least `gate`, ascending.
///
/// Missing similarities never match, whatever the gate.
pub fn matched_indices(similarities: &[Option<f32>], gate: f32) -> Vec<usize> {
    similarities
        .iter()
        .enumerate()
        .filter(|(_, sim)| sim.is_some_and(|sim| sim >= gate))
        .map(|(i, _)| i)
        .collect()
}

/// `min(max_marks, matched)`.
pub fn capped_award(matched: usize, max_marks: u32) -> u32 {
    u32::try_from(matched).map_or(max_marks, |m| m.min(max_marks))
}
