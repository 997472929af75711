//! Reference quantile models
//!
//! Small underlying models used in tests, demos, and as templates for
//! plugging in external regressors.
//!
//! * `empirical`: marginal empirical quantiles, the exchangeability baseline.
//! * `linear`: linear pinball-loss quantile regression.

pub mod empirical;
pub mod linear;

pub use empirical::EmpiricalQuantile;
pub use linear::LinearQuantile;
