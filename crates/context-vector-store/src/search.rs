//! Cosine-similarity scoring (spec §4.4, Open Question decision: distance
//! metric = cosine). `score = max(0, 1 - d/2)` where `d = 1 - cosine` lies
//! in `[0, 2]`, so orthogonal vectors score 0.5 and identical vectors score
//! 1.0.

#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[must_use]
pub fn score(a: &[f32], b: &[f32]) -> f32 {
    let cosine = cosine_similarity(a, b);
    let distance = 1.0 - cosine;
    (1.0 - distance / 2.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn identical_vectors_score_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((score(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_score_half() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!((score(&a, &b) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors_score_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert_eq!(score(&a, &b), 0.0);
    }

    #[test]
    fn mismatched_dimensions_score_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }
}
