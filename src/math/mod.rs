//! Statistical primitives for pair discovery and signal generation.
//!
//! Least squares, the Augmented Dickey-Fuller test, Engle-Granger cointegration
//! with MacKinnon p-values, AR(1) half-life and rolling statistics.

pub mod adf;
pub mod coint;
pub mod mackinnon;
pub mod ols;
pub mod stats;

pub use adf::{adf_test, AdfResult, Trend};
pub use coint::{engle_granger, half_life, half_life_from_beta, CointResult};
pub use ols::{ols, ols_with_intercept, OlsFit};

use thiserror::Error;

/// Failure of a statistical estimate. Callers usually treat these as "skip this input".
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("Insufficient data: expected at least {expected} data points, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    #[error("Regressor and response lengths differ")]
    DimensionMismatch,

    #[error("Singular design matrix (constant or collinear regressors)")]
    Singular,

    #[error("Input contains NaN or infinite values")]
    NonFinite,

    #[error("Spread is not mean-reverting (AR(1) coefficient {beta:.4} >= 0)")]
    NotMeanReverting { beta: f64 },
}
