//! Configuration for the cointegration scanner

use serde::{Deserialize, Serialize};

/// Which acceptance rules the scanner applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Every ticker pair, cointegration p-value only, ranked by ascending p-value.
    AllPairs,
    /// Same-sector pairs with hedge-ratio bounds, ADF, half-life and a composite
    /// score, ranked by descending score with a per-sector cap.
    SectorGrouped,
}

impl std::str::FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "all_pairs" | "all" => Ok(ScanMode::AllPairs),
            "sector_grouped" | "sector" => Ok(ScanMode::SectorGrouped),
            _ => Err(format!(
                "Unknown scan mode: {}. Valid options: all-pairs, sector-grouped",
                s
            )),
        }
    }
}

/// Scanner thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "default_mode")]
    pub mode: ScanMode,

    /// Accept pairs whose Engle-Granger p-value is strictly below this
    #[serde(default = "default_p_threshold")]
    pub p_threshold: f64,

    /// Pairs with fewer aligned observations are skipped
    #[serde(default = "default_min_observations")]
    pub min_observations: usize,

    /// Bounds on |hedge ratio| (sector-grouped mode)
    #[serde(default = "default_min_hedge_ratio")]
    pub min_hedge_ratio: f64,
    #[serde(default = "default_max_hedge_ratio")]
    pub max_hedge_ratio: f64,

    /// Spread ADF p-value must be strictly below this (sector-grouped mode)
    #[serde(default = "default_adf_pvalue")]
    pub adf_pvalue: f64,

    #[serde(default = "default_adf_max_lag")]
    pub adf_max_lag: usize,

    /// Maximum number of pairs kept after diversification
    #[serde(default = "default_max_pairs")]
    pub max_pairs: usize,

    #[serde(default = "default_max_per_sector")]
    pub max_per_sector: usize,
}

fn default_mode() -> ScanMode {
    ScanMode::AllPairs
}
fn default_p_threshold() -> f64 {
    0.05
}
fn default_min_observations() -> usize {
    100
}
fn default_min_hedge_ratio() -> f64 {
    0.1
}
fn default_max_hedge_ratio() -> f64 {
    10.0
}
fn default_adf_pvalue() -> f64 {
    0.05
}
fn default_adf_max_lag() -> usize {
    20
}
fn default_max_pairs() -> usize {
    10
}
fn default_max_per_sector() -> usize {
    2
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            p_threshold: default_p_threshold(),
            min_observations: default_min_observations(),
            min_hedge_ratio: default_min_hedge_ratio(),
            max_hedge_ratio: default_max_hedge_ratio(),
            adf_pvalue: default_adf_pvalue(),
            adf_max_lag: default_adf_max_lag(),
            max_pairs: default_max_pairs(),
            max_per_sector: default_max_per_sector(),
        }
    }
}

impl ScannerConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.p_threshold > 0.0 && self.p_threshold < 1.0) {
            return Err(format!(
                "p_threshold must be in (0, 1), got {}",
                self.p_threshold
            ));
        }
        if !(self.adf_pvalue > 0.0 && self.adf_pvalue < 1.0) {
            return Err(format!("adf_pvalue must be in (0, 1), got {}", self.adf_pvalue));
        }
        if self.min_observations < 10 {
            return Err(format!(
                "min_observations must be at least 10, got {}",
                self.min_observations
            ));
        }
        if self.min_hedge_ratio < 0.0 || self.min_hedge_ratio >= self.max_hedge_ratio {
            return Err(format!(
                "hedge ratio bounds must satisfy 0 <= min < max, got [{}, {}]",
                self.min_hedge_ratio, self.max_hedge_ratio
            ));
        }
        if self.max_pairs == 0 {
            return Err("max_pairs must be at least 1".to_string());
        }
        if self.max_per_sector == 0 {
            return Err("max_per_sector must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ScannerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cfg = ScannerConfig {
            p_threshold: 1.5,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = ScannerConfig {
            min_hedge_ratio: 5.0,
            max_hedge_ratio: 2.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = ScannerConfig {
            max_per_sector: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: ScannerConfig = serde_json::from_str(r#"{"mode":"sector_grouped"}"#).unwrap();
        assert_eq!(cfg.mode, ScanMode::SectorGrouped);
        assert_eq!(cfg.max_per_sector, 2);
        assert_eq!("sector-grouped".parse::<ScanMode>().unwrap(), ScanMode::SectorGrouped);
    }
}
