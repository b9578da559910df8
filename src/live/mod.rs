//! Live signal tracking
//!
//! Each configured pair owns a small mutable [`PairPosition`]. Every poll the
//! tracker recomputes the trailing z-score of each spread from recent bars,
//! steps the state machine and turns transitions into sized
//! [`TradeAction`]s for the recorder and the executor.

pub mod position;
pub mod sizing;
pub mod tracker;
pub mod zscore;

pub use position::{ActionKind, PairPosition, TradeAction};
pub use sizing::Sizer;
pub use tracker::{LiveTracker, TickReport};
pub use zscore::live_zscore;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::execution::ExecutorId;
use crate::strategy::config::validate_thresholds;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    /// Trailing bars used for the live z-score
    #[serde(default = "default_zscore_lookback")]
    pub zscore_lookback: usize,

    #[serde(default = "default_entry_z")]
    pub entry_z: f64,

    #[serde(default = "default_exit_z")]
    pub exit_z: f64,

    /// Seconds between polls
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    #[serde(default = "default_total_capital")]
    pub total_capital: Decimal,

    /// Fraction of capital committed to each leg of an active pair
    #[serde(default = "default_alloc_per_pair")]
    pub alloc_per_pair: Decimal,

    /// Pair table written by the scan command
    #[serde(default = "default_pairs_file")]
    pub pairs_file: PathBuf,

    #[serde(default = "default_signals_file")]
    pub signals_file: PathBuf,

    #[serde(default = "default_positions_file")]
    pub positions_file: PathBuf,

    #[serde(default = "default_executor")]
    pub executor: ExecutorId,
}

fn default_zscore_lookback() -> usize {
    60
}
fn default_entry_z() -> f64 {
    2.0
}
fn default_exit_z() -> f64 {
    0.5
}
fn default_interval_secs() -> u64 {
    300
}
fn default_total_capital() -> Decimal {
    dec!(1000000)
}
fn default_alloc_per_pair() -> Decimal {
    dec!(0.10)
}
fn default_pairs_file() -> PathBuf {
    PathBuf::from("data/pairs.csv")
}
fn default_signals_file() -> PathBuf {
    PathBuf::from("live/signals.csv")
}
fn default_positions_file() -> PathBuf {
    PathBuf::from("live/positions.json")
}
fn default_executor() -> ExecutorId {
    ExecutorId::Paper
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            zscore_lookback: default_zscore_lookback(),
            entry_z: default_entry_z(),
            exit_z: default_exit_z(),
            interval_secs: default_interval_secs(),
            total_capital: default_total_capital(),
            alloc_per_pair: default_alloc_per_pair(),
            pairs_file: default_pairs_file(),
            signals_file: default_signals_file(),
            positions_file: default_positions_file(),
            executor: default_executor(),
        }
    }
}

impl LiveConfig {
    pub fn alloc_per_pair_f64(&self) -> f64 {
        self.alloc_per_pair.to_f64().unwrap_or(0.0)
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_thresholds(self.zscore_lookback, self.entry_z, self.exit_z)?;
        if self.interval_secs == 0 {
            return Err("interval_secs must be positive".to_string());
        }
        if self.total_capital <= Decimal::ZERO {
            return Err(format!("total_capital must be positive, got {}", self.total_capital));
        }
        if self.alloc_per_pair <= Decimal::ZERO || self.alloc_per_pair > Decimal::ONE {
            return Err(format!(
                "alloc_per_pair must be in (0, 1], got {}",
                self.alloc_per_pair
            ));
        }
        Ok(())
    }
}
