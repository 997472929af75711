//! Errors
//!
//! Custom error types used throughout the `nexcp` crate.
use thiserror::Error;

/// Errors that can occur while calibrating or querying a conformal predictor.
#[derive(Debug, Error)]
pub enum ConformalError {
    /// `calibrate` was called before the underlying model was fitted.
    #[error("Model has not been fitted yet, call `fit` before `calibrate`.")]
    NotFitted,
    /// `predict` was called before calibration.
    #[error("Predictor has not been calibrated yet, call `calibrate` before `predict`.")]
    NotCalibrated,
    /// The weighted empirical distribution is undefined.
    #[error("Invalid calibration weights: {0}")]
    InvalidWeights(String),
    /// Sequence lengths disagree.
    #[error("Dimension mismatch, expected length {expected} but {actual} provided.")]
    DimensionMismatch { expected: usize, actual: usize },
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameter(String, String, String),
    /// Unable to write predictor to file.
    #[error("Unable to write predictor to file: {0}")]
    UnableToWrite(String),
    /// Unable to read predictor from file.
    #[error("Unable to read predictor from a file {0}")]
    UnableToRead(String),
}
