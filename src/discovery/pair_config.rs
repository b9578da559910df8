//! Pair configuration table shared between the scan and the live tracker.
//!
//! Stored as CSV with the header `ticker_a,ticker_b,hedge_ratio,sector`.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

use super::candidate::PairCandidate;
use super::error::DiscoveryError;
use crate::data::UNKNOWN_SECTOR;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairConfig {
    pub ticker_a: String,
    pub ticker_b: String,
    pub hedge_ratio: f64,
    #[serde(default = "default_sector")]
    pub sector: String,
}

fn default_sector() -> String {
    UNKNOWN_SECTOR.to_string()
}

impl PairConfig {
    pub fn new(ticker_a: &str, ticker_b: &str, hedge_ratio: f64, sector: &str) -> Self {
        Self {
            ticker_a: ticker_a.to_string(),
            ticker_b: ticker_b.to_string(),
            hedge_ratio,
            sector: sector.to_string(),
        }
    }

    pub fn label(&self) -> String {
        super::candidate::pair_label(&self.ticker_a, &self.ticker_b)
    }
}

impl From<&PairCandidate> for PairConfig {
    fn from(c: &PairCandidate) -> Self {
        Self {
            ticker_a: c.ticker_a.clone(),
            ticker_b: c.ticker_b.clone(),
            hedge_ratio: c.hedge_ratio,
            sector: c.sector.clone().unwrap_or_else(default_sector),
        }
    }
}

/// Hand-picked pairs used when no scan output is available.
pub fn fallback_pairs() -> Vec<PairConfig> {
    vec![
        PairConfig::new("KO", "PEP", 1.0, "Consumer Staples"),
        PairConfig::new("XOM", "CVX", 1.0, "Energy"),
        PairConfig::new("GS", "MS", 1.0, "Financials"),
        PairConfig::new("JPM", "BAC", 1.0, "Financials"),
        PairConfig::new("HD", "LOW", 1.0, "Consumer Discretionary"),
    ]
}

pub fn load_pair_configs(path: &Path) -> Result<Vec<PairConfig>, DiscoveryError> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
    let mut pairs = Vec::new();
    for row in reader.deserialize() {
        let pair: PairConfig = row?;
        if !pair.hedge_ratio.is_finite() {
            return Err(DiscoveryError::InvalidConfig(format!(
                "non-finite hedge ratio for {}",
                pair.label()
            )));
        }
        pairs.push(pair);
    }
    info!(path = %path.display(), pairs = pairs.len(), "Loaded pair configuration");
    Ok(pairs)
}

/// Loads the pair table, falling back to [`fallback_pairs`] when the file is
/// missing, unreadable or empty.
pub fn load_or_fallback(path: &Path) -> Vec<PairConfig> {
    match load_pair_configs(path) {
        Ok(pairs) if !pairs.is_empty() => pairs,
        Ok(_) => {
            warn!(path = %path.display(), "Pair configuration is empty, using fallback pairs");
            fallback_pairs()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Pair configuration unavailable, using fallback pairs");
            fallback_pairs()
        }
    }
}

pub fn save_pair_configs(path: &Path, pairs: &[PairConfig]) -> Result<(), DiscoveryError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut writer = csv::Writer::from_path(path)?;
    for pair in pairs {
        writer.serialize(pair)?;
    }
    writer.flush()?;
    info!(path = %path.display(), pairs = pairs.len(), "Saved pair configuration");
    Ok(())
}
