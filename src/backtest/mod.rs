//! Walk-forward backtesting
//!
//! Pairs are discovered on a training segment only and traded on the segment
//! that follows it. Windows advance by `step` sessions (the trading window by
//! default) and the per-day rows are stitched into a single chronological
//! result.

pub mod performance;
pub mod walk_forward;

pub use performance::{compute_metrics, equity_curve, PerformanceError, PerformanceReport};
pub use walk_forward::{run_backtest, BacktestParams, BacktestRow};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacktestError {
    /// Every window was skipped or the matrix was too short for a single window
    #[error("Backtest produced no results")]
    NoResults,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Insufficient data: need {needed} sessions, have {available}")]
    InsufficientData { needed: usize, available: usize },
}

/// Window sizes, in sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardConfig {
    #[serde(default = "default_training_window")]
    pub training_window: usize,

    #[serde(default = "default_trading_window")]
    pub trading_window: usize,

    /// Offset advance between windows. Defaults to `trading_window`; smaller
    /// values produce overlapping trading segments.
    #[serde(default)]
    pub step: Option<usize>,
}

fn default_training_window() -> usize {
    252
}
fn default_trading_window() -> usize {
    63
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            training_window: default_training_window(),
            trading_window: default_trading_window(),
            step: None,
        }
    }
}

impl WalkForwardConfig {
    pub fn step(&self) -> usize {
        self.step.unwrap_or(self.trading_window)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.training_window == 0 || self.trading_window == 0 {
            return Err(format!(
                "windows must be positive, got training {} trading {}",
                self.training_window, self.trading_window
            ));
        }
        if self.step == Some(0) {
            return Err("step must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_defaults_to_trading_window() {
        let cfg = WalkForwardConfig::default();
        assert_eq!(cfg.step(), 63);
        let cfg = WalkForwardConfig {
            step: Some(21),
            ..Default::default()
        };
        assert_eq!(cfg.step(), 21);
        assert!(WalkForwardConfig {
            step: Some(0),
            ..Default::default()
        }
        .validate()
        .is_err());
    }
}
