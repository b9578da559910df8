//! CLI command handlers.
//!
//! This module contains the implementation for each CLI subcommand,
//! delegating to the scanner, the walk-forward engine and the live tracker.

mod backtest;
mod live;
mod scan;

pub use backtest::run_backtest;
pub use live::run_live;
pub use scan::run_scan;

use std::collections::HashMap;
use tracing::{info, warn};

use crate::config::StatArbConfig;
use crate::data::{create_provider, CsvSectors, DataError, PriceMatrix, SectorSource, StaticSectors};

/// Universe prices with the benchmark column split out.
pub(crate) struct LoadedPrices {
    pub assets: PriceMatrix,
    pub benchmark: Option<Vec<f64>>,
}

/// Fetches the universe and benchmark in one request, then separates them.
pub(crate) async fn load_prices(config: &StatArbConfig) -> Result<LoadedPrices, DataError> {
    let provider = create_provider(config.provider.id, &config.provider.settings())?;
    let requested = config.universe.request_tickers();
    info!(
        provider = %config.provider.id,
        tickers = requested.len(),
        start = %config.universe.start,
        end = %config.universe.end,
        "Fetching price data"
    );
    let prices = provider
        .get_prices(&requested, config.universe.start_utc(), config.universe.end_utc())
        .await?;

    let benchmark = config
        .universe
        .benchmark
        .as_deref()
        .and_then(|b| prices.column(b).map(<[f64]>::to_vec));
    if config.universe.benchmark.is_some() && benchmark.is_none() {
        warn!("Benchmark missing from price data, beta will not be reported");
    }

    let asset_tickers: Vec<String> = prices
        .tickers()
        .iter()
        .filter(|t| Some(t.as_str()) != config.universe.benchmark.as_deref())
        .cloned()
        .collect();
    let assets = prices.select(&asset_tickers);
    info!(
        tickers = assets.tickers().len(),
        days = assets.len(),
        "Price data loaded"
    );
    Ok(LoadedPrices { assets, benchmark })
}

/// Sector mapping from the configured file, or the built-in GICS table.
pub(crate) fn load_sectors(config: &StatArbConfig) -> Result<HashMap<String, String>, DataError> {
    match &config.universe.sectors_file {
        Some(path) => Ok(CsvSectors::load(path)?.get_sectors()),
        None => Ok(StaticSectors.get_sectors()),
    }
}
