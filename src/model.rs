//! Model capability consumed by the conformal core.
//!
//! Any regressor able to fit itself and emit conditional quantile bands can
//! be conformalized; the core never looks inside the model.
use crate::data::Matrix;
use crate::errors::ConformalError;
use crate::score::QuantileBand;

/// Capability required of an underlying predictive model.
pub trait QuantileModel {
    /// Train the model on the given features and targets.
    fn fit(&mut self, data: &Matrix<f64>, y: &[f64]) -> Result<(), ConformalError>;

    /// Predict the conditional `alpha / 2` and `1 - alpha / 2` quantile band
    /// for every row of `data`.
    fn predict_quantiles(&self, data: &Matrix<f64>, alpha: f64) -> Result<Vec<QuantileBand>, ConformalError>;

    /// Forwarded random seed for models with randomized training.
    /// Models with deterministic training ignore it.
    fn set_seed(&mut self, _seed: u64) {}
}
