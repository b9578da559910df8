//! CLI configuration structs bridging CLI arguments to the configuration document.
//!
//! Each command gathers its flags into one of these structs and applies them
//! on top of the loaded [`StatArbConfig`], so a flag always wins over the file.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::StatArbConfig;
use crate::data::ProviderId;
use crate::discovery::ScanMode;
use crate::execution::ExecutorId;

/// Errors that can occur when turning CLI arguments into configuration.
#[derive(Debug, Error)]
pub enum CliConfigError {
    #[error("At least two tickers are required, got {0}")]
    TooFewTickers(usize),

    #[error("Start date {start} must be before end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

/// Splits a comma-separated ticker list, trimming and upper-casing entries.
pub fn parse_tickers(raw: &str) -> Result<Vec<String>, CliConfigError> {
    let mut tickers: Vec<String> = Vec::new();
    for t in raw.split(',').map(|s| s.trim().to_uppercase()).filter(|s| !s.is_empty()) {
        if !tickers.contains(&t) {
            tickers.push(t);
        }
    }
    if tickers.len() < 2 {
        return Err(CliConfigError::TooFewTickers(tickers.len()));
    }
    Ok(tickers)
}

/// Data selection flags shared by `scan` and `backtest`.
#[derive(Debug, Clone, Default)]
pub struct DataCliConfig {
    pub provider: Option<ProviderId>,
    pub tickers: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub csv_path: Option<PathBuf>,
}

impl DataCliConfig {
    pub fn apply(&self, config: &mut StatArbConfig) -> Result<(), CliConfigError> {
        if let Some(p) = self.provider {
            config.provider.id = p;
        }
        if let Some(raw) = &self.tickers {
            config.universe.tickers = parse_tickers(raw)?;
        }
        if let Some(s) = self.start {
            config.universe.start = s;
        }
        if let Some(e) = self.end {
            config.universe.end = e;
        }
        if let Some(path) = &self.csv_path {
            config.provider.csv_path = path.clone();
        }
        if config.universe.start >= config.universe.end {
            return Err(CliConfigError::InvalidDateRange {
                start: config.universe.start,
                end: config.universe.end,
            });
        }
        Ok(())
    }
}

/// CLI configuration for the walk-forward backtest.
#[derive(Debug, Clone, Default)]
pub struct BacktestCliConfig {
    pub data: DataCliConfig,
    pub mode: Option<ScanMode>,
    pub step: Option<usize>,
    pub output_dir: Option<PathBuf>,
}

impl BacktestCliConfig {
    pub fn apply(&self, config: &mut StatArbConfig) -> Result<(), CliConfigError> {
        self.data.apply(config)?;
        if let Some(m) = self.mode {
            config.scanner.mode = m;
        }
        if self.step.is_some() {
            config.walk_forward.step = self.step;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        Ok(())
    }
}

/// CLI configuration for a one-off pair scan.
#[derive(Debug, Clone, Default)]
pub struct ScanCliConfig {
    pub data: DataCliConfig,
    pub mode: Option<ScanMode>,
    pub max_pairs: Option<usize>,
    /// Pair table destination; defaults to the live section's pairs file
    pub output: Option<PathBuf>,
}

impl ScanCliConfig {
    pub fn apply(&self, config: &mut StatArbConfig) -> Result<(), CliConfigError> {
        self.data.apply(config)?;
        if let Some(m) = self.mode {
            config.scanner.mode = m;
        }
        if let Some(n) = self.max_pairs {
            config.scanner.max_pairs = n;
        }
        if let Some(path) = &self.output {
            config.live.pairs_file = path.clone();
        }
        Ok(())
    }
}

/// CLI configuration for the live tracker.
#[derive(Debug, Clone, Default)]
pub struct LiveCliConfig {
    pub provider: Option<ProviderId>,
    pub executor: Option<ExecutorId>,
    pub pairs_file: Option<PathBuf>,
    pub interval_secs: Option<u64>,
    pub max_ticks: Option<u64>,
}

impl LiveCliConfig {
    pub fn apply(&self, config: &mut StatArbConfig) {
        if let Some(p) = self.provider {
            config.provider.id = p;
        }
        if let Some(e) = self.executor {
            config.live.executor = e;
        }
        if let Some(path) = &self.pairs_file {
            config.live.pairs_file = path.clone();
        }
        if let Some(secs) = self.interval_secs {
            config.live.interval_secs = secs;
        }
    }
}
