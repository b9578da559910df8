//! Portfolio construction
//!
//! Turns pair signals into capped, leverage-limited ticker weights.

pub mod weights;

pub use weights::{build_weights, WeightTable};

use serde::{Deserialize, Serialize};

/// Position and leverage caps for the backtest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Per-leg weight when a pair is active, and the per-ticker clip
    #[serde(default = "default_max_position_weight")]
    pub max_position_weight: f64,

    /// Upper bound on the sum of absolute weights per session
    #[serde(default = "default_max_gross_leverage")]
    pub max_gross_leverage: f64,
}

fn default_max_position_weight() -> f64 {
    0.05
}
fn default_max_gross_leverage() -> f64 {
    4.0
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_position_weight: default_max_position_weight(),
            max_gross_leverage: default_max_gross_leverage(),
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.max_position_weight > 0.0) {
            return Err(format!(
                "max_position_weight must be positive, got {}",
                self.max_position_weight
            ));
        }
        if !(self.max_gross_leverage > 0.0) {
            return Err(format!(
                "max_gross_leverage must be positive, got {}",
                self.max_gross_leverage
            ));
        }
        if self.max_position_weight > self.max_gross_leverage {
            return Err(format!(
                "max_position_weight ({}) cannot exceed max_gross_leverage ({})",
                self.max_position_weight, self.max_gross_leverage
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_config_validation() {
        assert!(RiskConfig::default().validate().is_ok());
        let cfg = RiskConfig {
            max_position_weight: 5.0,
            max_gross_leverage: 1.0,
        };
        assert!(cfg.validate().is_err());
    }
}
