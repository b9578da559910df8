//! Z-score signal thresholds

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Trailing window of the rolling z-score, in sessions
    #[serde(default = "default_zscore_lookback")]
    pub zscore_lookback: usize,

    /// Enter when |z| reaches this level
    #[serde(default = "default_entry_z")]
    pub entry_z: f64,

    /// Exit when |z| falls to this level
    #[serde(default = "default_exit_z")]
    pub exit_z: f64,
}

fn default_zscore_lookback() -> usize {
    20
}
fn default_entry_z() -> f64 {
    2.0
}
fn default_exit_z() -> f64 {
    0.5
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            zscore_lookback: default_zscore_lookback(),
            entry_z: default_entry_z(),
            exit_z: default_exit_z(),
        }
    }
}

impl SignalConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_thresholds(self.zscore_lookback, self.entry_z, self.exit_z)
    }
}

/// Shared by the batch and live threshold sets.
pub(crate) fn validate_thresholds(lookback: usize, entry_z: f64, exit_z: f64) -> Result<(), String> {
    if lookback < 2 {
        return Err(format!("z-score lookback must be at least 2, got {}", lookback));
    }
    if !(exit_z >= 0.0 && entry_z.is_finite()) {
        return Err(format!(
            "thresholds must be finite and non-negative, got entry {} exit {}",
            entry_z, exit_z
        ));
    }
    if exit_z >= entry_z {
        return Err(format!(
            "exit_z ({}) must be below entry_z ({})",
            exit_z, entry_z
        ));
    }
    Ok(())
}
