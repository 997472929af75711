//! Nonconformity scoring
//!
//! Conversion between a model's raw quantile band, an observed target, and
//! the calibrated prediction interval. The signed score is what lets the
//! calibrated quantile both shrink overconfident bands and grow
//! underconfident ones.
use serde::{Deserialize, Serialize};

/// A model's raw estimate of the target's conditional lower and upper
/// quantiles, at levels `alpha / 2` and `1 - alpha / 2`, for one feature row.
///
/// Keeping `lower <= upper` is the model's responsibility. A crossed or NaN
/// band is passed through untouched and produces a degenerate interval
/// rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantileBand {
    /// Lower conditional quantile estimate.
    pub lower: f64,
    /// Upper conditional quantile estimate.
    pub upper: f64,
}

impl QuantileBand {
    /// Create a new QuantileBand.
    pub fn new(lower: f64, upper: f64) -> Self {
        QuantileBand { lower, upper }
    }
}

/// A calibrated prediction interval for a single test point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionInterval {
    /// Lower bound of the interval, `-inf` if unbounded below.
    pub lower: f64,
    /// Upper bound of the interval, `+inf` if unbounded above.
    pub upper: f64,
}

impl PredictionInterval {
    /// Whether the observed target falls inside the interval.
    pub fn contains(&self, y: f64) -> bool {
        self.lower <= y && y <= self.upper
    }

    /// Width of the interval, `+inf` when unbounded.
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Nonconformity score of an observation against a predicted band:
/// `max(lower - y, y - upper)`.
///
/// Positive when the observation falls outside the band (distance to the
/// nearest bound), negative when inside (magnitude of the containment
/// margin).
pub fn nonconformity(band: &QuantileBand, observed: f64) -> f64 {
    f64::max(band.lower - observed, observed - band.upper)
}

/// Expand (or contract, for a negative correction) a predicted band by the
/// calibrated correction.
///
/// An infinite correction yields an interval unbounded on both sides, which
/// is the required output when the calibration distribution places the
/// quantile on the virtual test point.
pub fn apply_correction(band: &QuantileBand, correction: f64) -> PredictionInterval {
    PredictionInterval {
        lower: band.lower - correction,
        upper: band.upper + correction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_outside_band() {
        let band = QuantileBand::new(-1.0, 1.0);
        assert_eq!(nonconformity(&band, 3.0), 2.0);
        assert_eq!(nonconformity(&band, -2.5), 1.5);
    }

    #[test]
    fn test_score_inside_band() {
        let band = QuantileBand::new(-1.0, 1.0);
        assert_eq!(nonconformity(&band, 0.5), -0.5);
        // Center of the band carries the largest containment margin.
        assert_eq!(nonconformity(&band, 0.0), -1.0);
    }

    #[test]
    fn test_score_on_boundary() {
        let band = QuantileBand::new(-1.0, 1.0);
        assert_eq!(nonconformity(&band, 1.0), 0.0);
    }

    #[test]
    fn test_correction_zero_is_identity() {
        let band = QuantileBand::new(0.25, 1.75);
        let interval = apply_correction(&band, 0.0);
        assert_eq!(interval.lower, band.lower);
        assert_eq!(interval.upper, band.upper);
    }

    #[test]
    fn test_correction_sign() {
        let band = QuantileBand::new(0.0, 2.0);
        let widened = apply_correction(&band, 0.5);
        assert!(widened.lower < band.lower && widened.upper > band.upper);
        let narrowed = apply_correction(&band, -0.5);
        assert!(narrowed.lower > band.lower && narrowed.upper < band.upper);
    }

    #[test]
    fn test_infinite_correction_is_unbounded() {
        let band = QuantileBand::new(0.0, 1.0);
        let interval = apply_correction(&band, f64::INFINITY);
        assert_eq!(interval.lower, f64::NEG_INFINITY);
        assert_eq!(interval.upper, f64::INFINITY);
        assert!(interval.contains(1e300));
        assert_eq!(interval.width(), f64::INFINITY);
    }

    #[test]
    fn test_contains_and_width() {
        let interval = PredictionInterval { lower: -1.0, upper: 3.0 };
        assert!(interval.contains(-1.0));
        assert!(interval.contains(3.0));
        assert!(!interval.contains(3.1));
        assert_eq!(interval.width(), 4.0);
    }
}
