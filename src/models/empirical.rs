//! Marginal empirical quantile model.
use crate::data::Matrix;
use crate::errors::ConformalError;
use crate::model::QuantileModel;
use crate::score::QuantileBand;
use serde::{Deserialize, Serialize};

/// Predicts the training targets' marginal quantiles for every row,
/// ignoring covariates entirely.
///
/// Useless as a point predictor, but the right baseline for conformal
/// calibration experiments: under exchangeable data the conformalized
/// version already attains nominal coverage.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EmpiricalQuantile {
    sorted_targets: Option<Vec<f64>>,
}

impl EmpiricalQuantile {
    /// Create a new, unfitted model.
    pub fn new() -> Self {
        EmpiricalQuantile::default()
    }

    fn empirical_quantile(sorted: &[f64], level: f64) -> f64 {
        let n = sorted.len();
        let k = ((n as f64) * level).ceil().max(1.0) as usize;
        sorted[k.min(n) - 1]
    }
}

impl QuantileModel for EmpiricalQuantile {
    fn fit(&mut self, data: &Matrix<f64>, y: &[f64]) -> Result<(), ConformalError> {
        if data.rows != y.len() {
            return Err(ConformalError::DimensionMismatch {
                expected: data.rows,
                actual: y.len(),
            });
        }
        if y.is_empty() {
            return Err(ConformalError::InvalidParameter(
                "y".to_string(),
                "a non-empty target sequence".to_string(),
                "an empty sequence".to_string(),
            ));
        }
        let mut sorted = y.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        self.sorted_targets = Some(sorted);
        Ok(())
    }

    fn predict_quantiles(&self, data: &Matrix<f64>, alpha: f64) -> Result<Vec<QuantileBand>, ConformalError> {
        let sorted = self.sorted_targets.as_ref().ok_or(ConformalError::NotFitted)?;
        let band = QuantileBand::new(
            Self::empirical_quantile(sorted, alpha / 2.0),
            Self::empirical_quantile(sorted, 1.0 - alpha / 2.0),
        );
        Ok(vec![band; data.rows])
    }
}
