//! Conformalized predictor
//!
//! Composes an underlying quantile model, a weighting scheme, and the
//! weighted quantile engine across the fit / calibrate / predict lifecycle.
use crate::data::Matrix;
use crate::errors::ConformalError;
use crate::model::QuantileModel;
use crate::quantile::weighted_quantile;
use crate::score::{apply_correction, nonconformity, PredictionInterval};
use crate::weights::{TestContext, Weighting};
use log::{info, warn};
use rayon::prelude::*;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything recorded by `calibrate` and read back by `predict`: the
/// nonconformity scores, the ordering keys, and the feature rows needed to
/// rebuild weights per test point. Replaced wholesale on recalibration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationState {
    scores: Vec<f64>,
    indices: Vec<usize>,
    features: Vec<Vec<f64>>,
}

/// Lifecycle of the predictor. Operations are only permitted in matching
/// or later states.
#[derive(Debug, Clone, Serialize, Deserialize)]
enum Lifecycle {
    Uninitialized,
    Fitted,
    Calibrated(CalibrationState),
}

/// Split-conformal predictor with pluggable weighting for non-exchangeable
/// data.
///
/// Wraps any [`QuantileModel`] and calibrates its raw quantile bands on a
/// held-out set, producing prediction intervals with a finite-sample
/// coverage guarantee at level `1 - alpha` under the configured weighting
/// scheme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConformalRegressor<M> {
    model: M,
    alpha: f64,
    weighting: Weighting,
    seed: u64,
    state: Lifecycle,
}

impl<M> ConformalRegressor<M>
where
    M: QuantileModel,
{
    /// Create a new predictor around an underlying quantile model.
    ///
    /// * `model` - The underlying model; consumed and owned.
    /// * `alpha` - Miscoverage target in (0, 1). Rejected here, not at
    ///   predict time.
    pub fn new(model: M, alpha: f64) -> Result<Self, ConformalError> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(ConformalError::InvalidParameter(
                "alpha".to_string(),
                "a value in (0, 1)".to_string(),
                alpha.to_string(),
            ));
        }
        Ok(ConformalRegressor {
            model,
            alpha,
            weighting: Weighting::default(),
            seed: 0,
            state: Lifecycle::Uninitialized,
        })
    }

    /// Set the weighting scheme on the predictor.
    /// * `weighting` - The scheme and its parameters, validated here.
    pub fn set_weighting(mut self, weighting: Weighting) -> Result<Self, ConformalError> {
        weighting.validate()?;
        self.weighting = weighting;
        Ok(self)
    }

    /// Set the random seed, forwarded to the underlying model only.
    /// * `seed` - Seed for models with randomized training.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.model.set_seed(seed);
        self
    }

    /// Miscoverage target.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Configured weighting scheme.
    pub fn weighting(&self) -> Weighting {
        self.weighting
    }

    /// Whether the predictor has been calibrated.
    pub fn is_calibrated(&self) -> bool {
        matches!(self.state, Lifecycle::Calibrated(_))
    }

    /// Recorded nonconformity scores, once calibrated.
    pub fn calibration_scores(&self) -> Option<&[f64]> {
        match &self.state {
            Lifecycle::Calibrated(cal) => Some(&cal.scores),
            _ => None,
        }
    }

    /// Train the underlying model. Any previous calibration is discarded.
    ///
    /// * `data` - The training feature matrix.
    /// * `y` - The training targets.
    pub fn fit(&mut self, data: &Matrix<f64>, y: &[f64]) -> Result<(), ConformalError> {
        if data.rows != y.len() {
            return Err(ConformalError::DimensionMismatch {
                expected: data.rows,
                actual: y.len(),
            });
        }
        self.model.fit(data, y)?;
        info!("Fitted underlying quantile model on {} samples.", y.len());
        self.state = Lifecycle::Fitted;
        Ok(())
    }

    /// Score a held-out calibration set against the fitted model's bands.
    ///
    /// Each call fully replaces the calibration state. Calibration points
    /// receive consecutive ordering keys `0..n` in the order given, which
    /// is the axis `Weighting::TimeDecay` measures gaps on.
    ///
    /// * `data` - The calibration feature matrix.
    /// * `y` - The calibration targets.
    pub fn calibrate(&mut self, data: &Matrix<f64>, y: &[f64]) -> Result<(), ConformalError> {
        if matches!(self.state, Lifecycle::Uninitialized) {
            return Err(ConformalError::NotFitted);
        }
        if data.rows != y.len() {
            return Err(ConformalError::DimensionMismatch {
                expected: data.rows,
                actual: y.len(),
            });
        }
        let bands = self.model.predict_quantiles(data, self.alpha)?;
        if bands.len() != y.len() {
            return Err(ConformalError::DimensionMismatch {
                expected: y.len(),
                actual: bands.len(),
            });
        }
        let scores: Vec<f64> = bands.iter().zip(y).map(|(band, y_)| nonconformity(band, *y_)).collect();
        let features: Vec<Vec<f64>> = (0..data.rows).map(|i| data.get_row(i)).collect();
        info!(
            "Calibrated on {} samples, max nonconformity score {:.6}.",
            scores.len(),
            scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
        );
        self.state = Lifecycle::Calibrated(CalibrationState {
            scores,
            indices: (0..y.len()).collect(),
            features,
        });
        Ok(())
    }

    /// Produce one calibrated prediction interval per test row.
    ///
    /// * `data` - The test feature matrix.
    /// * `test_indices` - Ordering key per test row, on the same axis as the
    ///   calibration keys. Defaults to consecutive positions continuing the
    ///   calibration sequence.
    /// * `parallel` - If `true`, rows are processed in parallel using Rayon.
    pub fn predict(
        &self,
        data: &Matrix<f64>,
        test_indices: Option<&[usize]>,
        parallel: bool,
    ) -> Result<Vec<PredictionInterval>, ConformalError> {
        let cal = match &self.state {
            Lifecycle::Calibrated(cal) => cal,
            _ => return Err(ConformalError::NotCalibrated),
        };
        if let Some(indices) = test_indices {
            if indices.len() != data.rows {
                return Err(ConformalError::DimensionMismatch {
                    expected: data.rows,
                    actual: indices.len(),
                });
            }
        }
        let bands = self.model.predict_quantiles(data, self.alpha)?;
        if bands.len() != data.rows {
            return Err(ConformalError::DimensionMismatch {
                expected: data.rows,
                actual: bands.len(),
            });
        }
        let level = 1.0 - self.alpha;
        let weighting = self.weighting;

        let interval_for_row = |row: usize| -> Result<PredictionInterval, ConformalError> {
            let index = match test_indices {
                Some(indices) => indices[row],
                None => cal.indices.len() + row,
            };
            let features = data.get_row(row);
            let test = TestContext {
                index,
                features: &features,
            };
            let (weights, test_weight) = weighting.weights_for(&cal.indices, &cal.features, &test)?;
            let correction = weighted_quantile(&cal.scores, &weights, test_weight, level)?;
            if correction == f64::INFINITY {
                warn!("Calibrated correction for row {} is unbounded, emitting an infinite interval.", row);
            }
            Ok(apply_correction(&bands[row], correction))
        };

        if parallel {
            (0..data.rows).into_par_iter().map(interval_for_row).collect()
        } else {
            (0..data.rows).map(interval_for_row).collect()
        }
    }
}

/// IO
pub trait PredictorIO: Serialize + DeserializeOwned + Sized {
    /// Save a predictor as a json object to a file.
    ///
    /// * `path` - Path to save predictor.
    fn save_predictor<P: AsRef<Path>>(&self, path: P) -> Result<(), ConformalError> {
        fs::write(path, self.json_dump()?).map_err(|e| ConformalError::UnableToWrite(e.to_string()))
    }

    /// Dump a predictor as a json object.
    fn json_dump(&self) -> Result<String, ConformalError> {
        serde_json::to_string(self).map_err(|e| ConformalError::UnableToWrite(e.to_string()))
    }

    /// Load a predictor from a json string.
    ///
    /// * `json_str` - String object, which can be serialized to json.
    fn from_json(json_str: &str) -> Result<Self, ConformalError> {
        serde_json::from_str::<Self>(json_str).map_err(|e| ConformalError::UnableToRead(e.to_string()))
    }

    /// Load a predictor from a path to a json predictor object.
    ///
    /// * `path` - Path to load predictor from.
    fn load_predictor<P: AsRef<Path>>(path: P) -> Result<Self, ConformalError> {
        let json_str = fs::read_to_string(path).map_err(|e| ConformalError::UnableToRead(e.to_string()))?;
        Self::from_json(&json_str)
    }
}

impl<M> PredictorIO for ConformalRegressor<M> where M: QuantileModel + Serialize + DeserializeOwned {}
