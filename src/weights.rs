//! Weighting schemes
//!
//! How much each calibration point counts when estimating the distribution
//! of nonconformity at a future point. Schemes return raw, non-negative
//! weights and never normalize: normalization happens once, inside the
//! weighted quantile engine, together with the virtual test point mass.
use crate::errors::ConformalError;
use serde::{Deserialize, Serialize};

/// Context describing the single test point weights are being built for.
#[derive(Debug, Clone, Copy)]
pub struct TestContext<'a> {
    /// Ordinal position of the test point on the same axis as the
    /// calibration indices.
    pub index: usize,
    /// Feature row of the test point.
    pub features: &'a [f64],
}

/// Strategy assigning a relevance weight to every calibration point.
///
/// `Uniform` recovers classical split conformal prediction and is the
/// baseline every decayed variant must reduce to when its dependence
/// parameter is switched off (`rate = 1`, or `bandwidth -> inf`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum Weighting {
    /// All calibration points count equally. The exchangeable case.
    #[default]
    Uniform,
    /// Weight decays geometrically in the index gap between the calibration
    /// point and the test point: `rate^|j - i|`. Targets temporal
    /// non-exchangeability.
    TimeDecay {
        /// Decay rate per unit of index gap, in (0, 1].
        rate: f64,
    },
    /// Gaussian kernel over Euclidean feature distance:
    /// `exp(-d^2 / (2 * bandwidth^2))`. Targets covariate-shift
    /// non-exchangeability.
    FeatureKernel {
        /// Kernel bandwidth, finite and positive.
        bandwidth: f64,
    },
}

impl Weighting {
    /// Validate the scheme's parameters. Called once at predictor
    /// construction so malformed configuration never reaches `predict`.
    pub fn validate(&self) -> Result<(), ConformalError> {
        match *self {
            Weighting::Uniform => Ok(()),
            Weighting::TimeDecay { rate } => {
                if rate > 0.0 && rate <= 1.0 {
                    Ok(())
                } else {
                    Err(ConformalError::InvalidParameter(
                        "rate".to_string(),
                        "a value in (0, 1]".to_string(),
                        rate.to_string(),
                    ))
                }
            }
            Weighting::FeatureKernel { bandwidth } => {
                if bandwidth.is_finite() && bandwidth > 0.0 {
                    Ok(())
                } else {
                    Err(ConformalError::InvalidParameter(
                        "bandwidth".to_string(),
                        "a finite positive value".to_string(),
                        bandwidth.to_string(),
                    ))
                }
            }
        }
    }

    /// Raw weights for every calibration point against one test point, plus
    /// the mass assigned to the virtual test point itself.
    ///
    /// * `cal_indices` - Ordering keys of the calibration points.
    /// * `cal_features` - Feature rows of the calibration points, aligned
    ///   with `cal_indices`; only consulted by `FeatureKernel`.
    /// * `test` - Index and feature row of the test point.
    pub fn weights_for(
        &self,
        cal_indices: &[usize],
        cal_features: &[Vec<f64>],
        test: &TestContext,
    ) -> Result<(Vec<f64>, f64), ConformalError> {
        let weights = match *self {
            Weighting::Uniform => vec![1.0; cal_indices.len()],
            Weighting::TimeDecay { rate } => cal_indices
                .iter()
                .map(|i| {
                    let gap = test.index.abs_diff(*i);
                    rate.powi(gap as i32)
                })
                .collect(),
            Weighting::FeatureKernel { bandwidth } => {
                if cal_features.len() != cal_indices.len() {
                    return Err(ConformalError::DimensionMismatch {
                        expected: cal_indices.len(),
                        actual: cal_features.len(),
                    });
                }
                let denom = 2.0 * bandwidth * bandwidth;
                cal_features
                    .iter()
                    .map(|row| {
                        if row.len() != test.features.len() {
                            return Err(ConformalError::DimensionMismatch {
                                expected: test.features.len(),
                                actual: row.len(),
                            });
                        }
                        let d2: f64 = row
                            .iter()
                            .zip(test.features)
                            .map(|(a, b)| (a - b) * (a - b))
                            .sum();
                        Ok((-d2 / denom).exp())
                    })
                    .collect::<Result<Vec<f64>, ConformalError>>()?
            }
        };
        Ok((weights, 1.0))
    }
}
