//! Market Data Layer
//!
//! Price retrieval is consumed through the [`PriceProvider`] trait. Each backend
//! (flat file, synthetic generator, Alpaca broker API) implements it and is
//! selected at runtime through [`ProviderId`] and [`create_provider`].

pub mod alpaca;
pub mod csv_provider;
pub mod matrix;
pub mod sector;
pub mod synthetic;

pub use alpaca::AlpacaProvider;
pub use csv_provider::CsvProvider;
pub use matrix::PriceMatrix;
pub use sector::{CsvSectors, SectorSource, StaticSectors, UNKNOWN_SECTOR};
pub use synthetic::SyntheticProvider;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by price providers.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid price matrix: {0}")]
    InvalidMatrix(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Source of historical and recent close prices.
///
/// Implementations return a gap-free matrix: tickers they cannot serve are
/// dropped rather than failing the whole request.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Daily closes for `tickers` with timestamps in `[start, end)`.
    async fn get_prices(
        &self,
        tickers: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceMatrix, DataError>;

    /// A short, recent window of bars used by the live tracker on every tick.
    async fn fetch_recent_bars(&self, tickers: &[String]) -> Result<PriceMatrix, DataError>;

    fn provider_id(&self) -> ProviderId;
}

/// Provider identifier for factory/registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Csv,
    Synthetic,
    Alpaca,
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderId::Csv => write!(f, "csv"),
            ProviderId::Synthetic => write!(f, "synthetic"),
            ProviderId::Alpaca => write!(f, "alpaca"),
        }
    }
}

impl std::str::FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ProviderId::Csv),
            "synthetic" => Ok(ProviderId::Synthetic),
            "alpaca" => Ok(ProviderId::Alpaca),
            _ => Err(format!(
                "Unknown provider: {}. Valid options: csv, synthetic, alpaca",
                s
            )),
        }
    }
}

/// Backend-specific construction parameters.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Wide price file for the CSV provider.
    pub csv_path: PathBuf,
    /// Seed for the synthetic provider.
    pub seed: u64,
    /// Rows returned by `fetch_recent_bars` for file and synthetic backends.
    pub recent_rows: usize,
    /// Lookback of `fetch_recent_bars` for broker backends.
    pub recent_days: i64,
    /// Use the paper-trading endpoint for broker backends.
    pub paper: bool,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("data/prices.csv"),
            seed: 7,
            recent_rows: 120,
            recent_days: 5,
            paper: true,
        }
    }
}

/// Factory function to create price providers
pub fn create_provider(
    id: ProviderId,
    settings: &ProviderSettings,
) -> Result<Arc<dyn PriceProvider>, DataError> {
    match id {
        ProviderId::Csv => Ok(Arc::new(CsvProvider::open(
            &settings.csv_path,
            settings.recent_rows,
        )?)),
        ProviderId::Synthetic => Ok(Arc::new(SyntheticProvider::new(
            settings.seed,
            settings.recent_rows,
        ))),
        ProviderId::Alpaca => Ok(Arc::new(AlpacaProvider::from_env(
            settings.paper,
            settings.recent_days,
        )?)),
    }
}
