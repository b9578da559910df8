//! Top-level configuration document.
//!
//! Every section and field has a default, so an absent or partial JSON file
//! is valid. Credentials never live here; they come from the environment.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::backtest::{BacktestParams, WalkForwardConfig};
use crate::data::{ProviderId, ProviderSettings};
use crate::discovery::ScannerConfig;
use crate::live::LiveConfig;
use crate::portfolio::RiskConfig;
use crate::strategy::SignalConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid {section} configuration: {message}")]
    Invalid { section: &'static str, message: String },
}

/// Large-cap universe scanned by default.
pub const DEFAULT_UNIVERSE: &[&str] = &[
    "AAPL", "MSFT", "AMZN", "GOOGL", "META", "NVDA", "TSLA", "BRK-B", "JPM", "JNJ", "V", "UNH",
    "PG", "HD", "MA", "DIS", "BAC", "XOM", "PFE", "CSCO", "ADBE", "CRM", "ABT", "CVX", "KO",
    "PEP", "TMO", "COST", "AVGO", "MRK", "WMT", "LLY", "ACN", "MCD", "NEE", "LIN", "TXN", "DHR",
    "PM", "BMY", "AMGN", "HON", "UPS", "CAT", "GS", "LOW", "SBUX", "BLK", "ISRG", "MDT",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniverseConfig {
    #[serde(default = "default_tickers")]
    pub tickers: Vec<String>,

    /// Benchmark for beta; fetched alongside the universe and excluded from trading
    #[serde(default = "default_benchmark")]
    pub benchmark: Option<String>,

    #[serde(default = "default_start")]
    pub start: NaiveDate,

    /// Exclusive
    #[serde(default = "default_end")]
    pub end: NaiveDate,

    /// Annual risk-free rate for the Sharpe ratio
    #[serde(default)]
    pub risk_free_rate: f64,

    /// Optional `ticker,sector` file; the built-in GICS table is used otherwise
    #[serde(default)]
    pub sectors_file: Option<PathBuf>,
}

fn default_tickers() -> Vec<String> {
    DEFAULT_UNIVERSE.iter().map(|s| s.to_string()).collect()
}
fn default_benchmark() -> Option<String> {
    Some("SPY".to_string())
}
fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}
fn default_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            tickers: default_tickers(),
            benchmark: default_benchmark(),
            start: default_start(),
            end: default_end(),
            risk_free_rate: 0.0,
            sectors_file: None,
        }
    }
}

impl UniverseConfig {
    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
    }

    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
    }

    /// Universe plus the benchmark, deduplicated.
    pub fn request_tickers(&self) -> Vec<String> {
        let mut all = self.tickers.clone();
        if let Some(b) = &self.benchmark {
            if !all.contains(b) {
                all.push(b.clone());
            }
        }
        all
    }
}

/// Serializable mirror of [`ProviderSettings`] plus the backend choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider")]
    pub id: ProviderId,
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_recent_rows")]
    pub recent_rows: usize,
    #[serde(default = "default_recent_days")]
    pub recent_days: i64,
    #[serde(default = "default_paper")]
    pub paper: bool,
}

fn default_provider() -> ProviderId {
    ProviderId::Csv
}
fn default_csv_path() -> PathBuf {
    ProviderSettings::default().csv_path
}
fn default_seed() -> u64 {
    ProviderSettings::default().seed
}
fn default_recent_rows() -> usize {
    ProviderSettings::default().recent_rows
}
fn default_recent_days() -> i64 {
    ProviderSettings::default().recent_days
}
fn default_paper() -> bool {
    true
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            id: default_provider(),
            csv_path: default_csv_path(),
            seed: default_seed(),
            recent_rows: default_recent_rows(),
            recent_days: default_recent_days(),
            paper: default_paper(),
        }
    }
}

impl ProviderConfig {
    pub fn settings(&self) -> ProviderSettings {
        ProviderSettings {
            csv_path: self.csv_path.clone(),
            seed: self.seed,
            recent_rows: self.recent_rows,
            recent_days: self.recent_days,
            paper: self.paper,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatArbConfig {
    #[serde(default)]
    pub universe: UniverseConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub walk_forward: WalkForwardConfig,
    #[serde(default)]
    pub live: LiveConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

impl StatArbConfig {
    /// Reads a JSON file, or returns the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn section(name: &'static str, r: Result<(), String>) -> Result<(), ConfigError> {
            r.map_err(|message| ConfigError::Invalid {
                section: name,
                message,
            })
        }
        if self.universe.start >= self.universe.end {
            return Err(ConfigError::Invalid {
                section: "universe",
                message: format!(
                    "start {} must be before end {}",
                    self.universe.start, self.universe.end
                ),
            });
        }
        if self.universe.tickers.len() < 2 {
            return Err(ConfigError::Invalid {
                section: "universe",
                message: "at least two tickers are required".to_string(),
            });
        }
        section("scanner", self.scanner.validate())?;
        section("signal", self.signal.validate())?;
        section("risk", self.risk.validate())?;
        section("walk_forward", self.walk_forward.validate())?;
        section("live", self.live.validate())?;
        Ok(())
    }

    pub fn backtest_params(&self) -> BacktestParams {
        BacktestParams {
            walk_forward: self.walk_forward.clone(),
            scanner: self.scanner.clone(),
            signal: self.signal.clone(),
            risk: self.risk.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = StatArbConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.universe.tickers.len(), 50);
        assert_eq!(cfg.walk_forward.training_window, 252);
        assert_eq!(cfg.signal.zscore_lookback, 20);
        assert_eq!(cfg.risk.max_position_weight, 0.05);
        assert_eq!(cfg.universe.request_tickers().last().map(String::as_str), Some("SPY"));
    }

    #[test]
    fn test_partial_file_overrides_one_section() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("statarb.json");
        std::fs::write(
            &path,
            r#"{"signal": {"entry_z": 2.5}, "universe": {"tickers": ["KO", "PEP"], "benchmark": null}}"#,
        )
        .unwrap();

        let cfg = StatArbConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.signal.entry_z, 2.5);
        assert_eq!(cfg.signal.exit_z, 0.5);
        assert_eq!(cfg.universe.request_tickers(), vec!["KO".to_string(), "PEP".to_string()]);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_invalid_section_is_named() {
        let mut cfg = StatArbConfig::default();
        cfg.signal.exit_z = 3.0;
        match cfg.validate() {
            Err(ConfigError::Invalid { section, .. }) => assert_eq!(section, "signal"),
            other => panic!("expected invalid signal section, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{").unwrap();
        assert!(matches!(StatArbConfig::load(Some(&path)), Err(ConfigError::Parse { .. })));
    }
}
