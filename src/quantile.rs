//! Weighted empirical quantiles
//!
//! The statistical core of the crate: a weighted quantile of calibration
//! scores augmented with a virtual `+inf` point standing in for the still
//! unobserved test score. Including the virtual point is what makes the
//! finite-sample coverage bound hold without seeing the test label, so it
//! must never be dropped, and ties must be merged before any weight
//! normalization takes place.
use crate::data::FloatData;
use crate::errors::ConformalError;

/// Weighted quantile of a set of scores with a virtual `+inf` test point.
///
/// The `n + 1` weights (the `n` score weights plus `test_weight`) are
/// normalized to sum to one, scores with equal value are merged, and the
/// smallest score whose cumulative normalized weight reaches `level` is
/// returned. If the walk runs past every observed score before reaching
/// `level`, the virtual point itself is selected and the result is `+inf`.
///
/// * `scores` - Observed nonconformity scores, in any order.
/// * `weights` - Non-negative weight per score, aligned with `scores`.
/// * `test_weight` - Non-negative mass assigned to the virtual test point.
/// * `level` - Target cumulative level, in (0, 1).
pub fn weighted_quantile<T>(scores: &[T], weights: &[T], test_weight: T, level: T) -> Result<T, ConformalError>
where
    T: FloatData<T>,
{
    if !(level > T::ZERO && level < T::ONE) {
        return Err(ConformalError::InvalidParameter(
            "level".to_string(),
            "a value in (0, 1)".to_string(),
            format!("{}", level),
        ));
    }
    if scores.len() != weights.len() {
        return Err(ConformalError::DimensionMismatch {
            expected: scores.len(),
            actual: weights.len(),
        });
    }
    for w in weights.iter().chain(std::iter::once(&test_weight)) {
        if !(w.is_finite() && *w >= T::ZERO) {
            return Err(ConformalError::InvalidWeights(format!(
                "all weights must be finite and non-negative, got {}",
                w
            )));
        }
    }

    let total = chunked_sum(weights) + test_weight;
    if total == T::ZERO {
        return Err(ConformalError::InvalidWeights(
            "weights and test weight sum to zero, the normalized distribution is undefined".to_string(),
        ));
    }

    // No calibration information: the only mass is the virtual point.
    if scores.is_empty() {
        return Ok(T::INFINITY);
    }

    let mut idx: Vec<usize> = (0..scores.len()).collect();
    idx.sort_unstable_by(|a, b| scores[*a].partial_cmp(&scores[*b]).unwrap_or(std::cmp::Ordering::Equal));

    // Walk the sorted scores, merging the weight of exact ties before
    // accumulating, so the result is invariant to input ordering.
    let mut cuml = T::ZERO;
    let mut i = 0;
    while i < idx.len() {
        let value = scores[idx[i]];
        let mut merged = weights[idx[i]];
        let mut j = i + 1;
        while j < idx.len() && scores[idx[j]] == value {
            merged += weights[idx[j]];
            j += 1;
        }
        cuml += merged / total;
        if cuml >= level {
            return Ok(value);
        }
        i = j;
    }

    // The virtual +inf point is selected.
    Ok(T::INFINITY)
}

/// Chunked accumulation, matches a simple iterator sum for the sizes used
/// here but keeps the summation order deterministic across platforms.
pub(crate) fn chunked_sum<T: FloatData<T>>(values: &[T]) -> T {
    const LANES: usize = 8;
    let mut lanes = [T::ZERO; LANES];
    let chunks = values.chunks_exact(LANES);
    let remainder: T = chunks.remainder().iter().copied().sum();
    for chunk in chunks {
        for (lane, v) in lanes.iter_mut().zip(chunk) {
            *lane += *v;
        }
    }
    lanes.iter().copied().sum::<T>() + remainder
}
