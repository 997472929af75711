//! Interval evaluation metrics
//!
//! Read-only consumers of the predictor's output; nothing here feeds back
//! into calibration.
use crate::errors::ConformalError;
use crate::score::PredictionInterval;

/// Empirical fraction of targets falling inside their interval.
///
/// * `intervals` - One interval per target, order aligned.
/// * `y` - Observed targets.
pub fn empirical_coverage(intervals: &[PredictionInterval], y: &[f64]) -> Result<f64, ConformalError> {
    if intervals.len() != y.len() {
        return Err(ConformalError::DimensionMismatch {
            expected: intervals.len(),
            actual: y.len(),
        });
    }
    if intervals.is_empty() {
        return Ok(f64::NAN);
    }
    let hits = intervals.iter().zip(y).filter(|(interval, y_)| interval.contains(**y_)).count();
    Ok(hits as f64 / intervals.len() as f64)
}

/// Mean interval width, `+inf` as soon as any interval is unbounded.
pub fn mean_width(intervals: &[PredictionInterval]) -> f64 {
    if intervals.is_empty() {
        return f64::NAN;
    }
    intervals.iter().map(PredictionInterval::width).sum::<f64>() / intervals.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(lower: f64, upper: f64) -> PredictionInterval {
        PredictionInterval { lower, upper }
    }

    #[test]
    fn test_empirical_coverage() {
        let intervals = vec![interval(0.0, 1.0), interval(-1.0, 1.0), interval(2.0, 3.0), interval(0.0, 0.5)];
        let y = vec![0.5, 0.0, 5.0, 1.0];
        assert_eq!(empirical_coverage(&intervals, &y).unwrap(), 0.5);
    }

    #[test]
    fn test_coverage_length_mismatch() {
        let intervals = vec![interval(0.0, 1.0)];
        assert!(matches!(
            empirical_coverage(&intervals, &[0.5, 0.6]),
            Err(ConformalError::DimensionMismatch { expected: 1, actual: 2 })
        ));
    }

    #[test]
    fn test_mean_width() {
        let intervals = vec![interval(0.0, 1.0), interval(-2.0, 1.0)];
        assert_eq!(mean_width(&intervals), 2.0);
        let unbounded = vec![interval(0.0, 1.0), interval(f64::NEG_INFINITY, f64::INFINITY)];
        assert_eq!(mean_width(&unbounded), f64::INFINITY);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(empirical_coverage(&[], &[]).unwrap().is_nan());
        assert!(mean_width(&[]).is_nan());
    }
}
