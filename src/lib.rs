//! # nexcp
//!
//! Non-exchangeable split conformal prediction intervals for dependent data.
//!
//! Wraps any quantile-type regressor with a split-conformal calibration
//! layer whose weighted quantile carries a distribution-free, finite-sample
//! coverage guarantee, even when calibration and test points are not
//! exchangeable (time series, distribution shift).

// Modules
pub mod data;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod models;
pub mod predictor;
pub mod quantile;
pub mod score;
pub mod split;
pub mod synthetic;
pub mod weights;

// Individual classes, and functions
pub use data::Matrix;
pub use errors::ConformalError;
pub use model::QuantileModel;
pub use predictor::{ConformalRegressor, PredictorIO};
pub use quantile::weighted_quantile;
pub use score::{PredictionInterval, QuantileBand};
pub use weights::Weighting;
