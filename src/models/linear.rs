//! Linear quantile regression via pinball-loss subgradient descent.
use crate::data::Matrix;
use crate::errors::ConformalError;
use crate::model::QuantileModel;
use crate::score::QuantileBand;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Linear-in-features quantile regressor.
///
/// Trains one weight vector per band side by epochwise subgradient descent
/// on the pinball loss, with a decaying step size and seeded sample
/// shuffling. The target band levels are fixed at construction because
/// training happens per level; `predict_quantiles` rejects any other
/// `alpha`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearQuantile {
    /// Miscoverage level the band sides are trained for.
    pub alpha: f64,
    /// Number of passes over the training data.
    pub epochs: usize,
    /// Initial step size, decayed as `learning_rate / (1 + epoch)`.
    pub learning_rate: f64,
    seed: u64,
    // Trained coefficients, one per feature plus a trailing intercept.
    coef_lower: Option<Vec<f64>>,
    coef_upper: Option<Vec<f64>>,
}

impl LinearQuantile {
    /// Create a new model targeting the `alpha / 2` and `1 - alpha / 2`
    /// conditional quantiles.
    pub fn new(alpha: f64) -> Self {
        LinearQuantile {
            alpha,
            epochs: 200,
            learning_rate: 0.1,
            seed: 0,
            coef_lower: None,
            coef_upper: None,
        }
    }

    /// Set the number of training epochs.
    pub fn set_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Set the initial step size.
    pub fn set_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    fn predict_row(coef: &[f64], row: &[f64]) -> f64 {
        let (intercept, weights) = coef.split_last().expect("coefficients are never empty");
        weights.iter().zip(row).map(|(w, x)| w * x).sum::<f64>() + intercept
    }

    /// Fit one weight vector for the pinball loss at `level`.
    fn fit_level(&self, data: &Matrix<f64>, y: &[f64], level: f64) -> Vec<f64> {
        let mut coef = vec![0.0; data.cols + 1];
        let mut order: Vec<usize> = (0..data.rows).collect();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let scale = 1.0 / (data.rows.max(1) as f64);

        for epoch in 0..self.epochs {
            order.shuffle(&mut rng);
            let step = self.learning_rate / (1.0 + epoch as f64);
            for &i in &order {
                let row = data.get_row(i);
                let pred = Self::predict_row(&coef, &row);
                // Pinball subgradient: level on underprediction,
                // level - 1 on overprediction.
                let g = if y[i] > pred { -level } else { 1.0 - level };
                for (c, x) in coef.iter_mut().zip(row.iter().chain(std::iter::once(&1.0))) {
                    *c -= step * scale * g * x;
                }
            }
        }
        coef
    }
}

impl QuantileModel for LinearQuantile {
    fn fit(&mut self, data: &Matrix<f64>, y: &[f64]) -> Result<(), ConformalError> {
        if data.rows != y.len() {
            return Err(ConformalError::DimensionMismatch {
                expected: data.rows,
                actual: y.len(),
            });
        }
        self.coef_lower = Some(self.fit_level(data, y, self.alpha / 2.0));
        self.coef_upper = Some(self.fit_level(data, y, 1.0 - self.alpha / 2.0));
        Ok(())
    }

    fn predict_quantiles(&self, data: &Matrix<f64>, alpha: f64) -> Result<Vec<QuantileBand>, ConformalError> {
        if alpha != self.alpha {
            return Err(ConformalError::InvalidParameter(
                "alpha".to_string(),
                self.alpha.to_string(),
                alpha.to_string(),
            ));
        }
        let (lower, upper) = match (self.coef_lower.as_ref(), self.coef_upper.as_ref()) {
            (Some(lower), Some(upper)) => (lower, upper),
            _ => return Err(ConformalError::NotFitted),
        };
        Ok((0..data.rows)
            .map(|i| {
                let row = data.get_row(i);
                QuantileBand::new(Self::predict_row(lower, &row), Self::predict_row(upper, &row))
            })
            .collect())
    }

    fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }
}
