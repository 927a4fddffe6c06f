//! Min-max score normalization shared by every retriever and fusion policy.

/// Keeps `max - min` strictly positive in the denominator.
pub const NORMALIZE_EPSILON: f64 = 1e-8;

/// Rescale `scores` into `[0, 1]`, preserving length and order.
///
/// `(x - min) / (max - min + ε)`. When every score is equal (including empty
/// and single-element input) every output is 0, so a flat list never looks
/// confident.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn normalize(scores: &[f64]) -> Vec<f64> {
    let Some((min, max)) = min_max(scores) else {
        return Vec::new();
    };
    if max == min {
        return vec![0.0; scores.len()];
    }
    let range = max - min + NORMALIZE_EPSILON;
    scores.iter().map(|s| (s - min) / range).collect()
}

/// Single-pass min/max computation.
fn min_max(scores: &[f64]) -> Option<(f64, f64)> {
    if scores.is_empty() {
        return None;
    }
    let mut min = f64::MAX;
    let mut max = f64::MIN;
    for &s in scores {
        if s < min {
            min = s;
        }
        if s > max {
            max = s;
        }
    }
    Some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn single_score_is_zero() {
        assert_eq!(normalize(&[0.73]), vec![0.0]);
    }

    #[test]
    fn equal_scores_are_all_zero() {
        assert_eq!(normalize(&[0.5, 0.5, 0.5]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn min_maps_to_zero_and_max_to_almost_one() {
        let out = normalize(&[2.0, 4.0, 3.0]);
        assert!(out[0].abs() < 1e-12);
        assert!((out[1] - 1.0).abs() < 1e-6);
        assert!(out[1] < 1.0);
        assert!((out[2] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn negative_similarities_are_rescaled() {
        let out = normalize(&[-0.5, 0.5]);
        assert!(out[0].abs() < 1e-12);
        assert!(out[1] > 0.99);
    }
}
