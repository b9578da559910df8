//! Ticker to GICS sector classification.
//!
//! The scanner only needs `ticker -> sector name`. A static table covers the
//! most liquid S&P 500 names; a CSV file (`ticker,sector`) can replace it.

use lazy_static::lazy_static;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use super::DataError;

/// Sector label used for tickers missing from the mapping.
pub const UNKNOWN_SECTOR: &str = "Unknown";

const GICS_TABLE: &[(&str, &[&str])] = &[
    (
        "Energy",
        &["XOM", "CVX", "COP", "SLB", "EOG", "MPC", "PSX", "VLO", "OXY", "HAL", "DVN", "HES"],
    ),
    (
        "Information Technology",
        &[
            "AAPL", "MSFT", "NVDA", "AVGO", "AMD", "INTC", "CRM", "ADBE", "CSCO", "TXN", "QCOM",
            "AMAT", "MU", "LRCX", "KLAC", "MCHP", "ADI", "SNPS", "CDNS", "NXPI", "ACN",
        ],
    ),
    (
        "Financials",
        &[
            "JPM", "BAC", "WFC", "GS", "MS", "C", "BLK", "SCHW", "USB", "PNC", "TFC", "AXP",
            "CME", "ICE", "MCO", "SPGI", "MMC", "CB", "V", "MA", "BRK-B",
        ],
    ),
    (
        "Consumer Staples",
        &[
            "PG", "KO", "PEP", "COST", "WMT", "PM", "MO", "CL", "MDLZ", "KDP", "STZ", "KHC",
            "GIS", "HSY", "SJM",
        ],
    ),
    (
        "Health Care",
        &[
            "UNH", "JNJ", "LLY", "PFE", "MRK", "ABBV", "TMO", "ABT", "DHR", "BMY", "AMGN",
            "GILD", "ISRG", "MDT", "SYK", "ZTS", "BSX", "VRTX",
        ],
    ),
    (
        "Communication Services",
        &["GOOGL", "META", "DIS", "NFLX", "CMCSA", "T", "VZ", "TMUS"],
    ),
    (
        "Consumer Discretionary",
        &["AMZN", "TSLA", "HD", "MCD", "NKE", "LOW", "SBUX", "TJX", "BKNG", "MAR"],
    ),
    (
        "Industrials",
        &[
            "HON", "UPS", "CAT", "DE", "RTX", "LMT", "GE", "BA", "MMM", "FDX", "WM", "EMR", "ITW",
            "ETN", "NSC", "CSX", "UNP",
        ],
    ),
    (
        "Utilities",
        &["NEE", "DUK", "SO", "D", "AEP", "EXC", "SRE", "XEL", "WEC"],
    ),
    (
        "Real Estate",
        &["PLD", "AMT", "CCI", "EQIX", "PSA", "SPG"],
    ),
    (
        "Materials",
        &["LIN", "APD", "SHW", "ECL", "FCX", "NEM", "NUE", "DOW"],
    ),
];

lazy_static! {
    static ref GICS_SECTORS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        for (sector, tickers) in GICS_TABLE {
            for t in *tickers {
                m.insert(*t, *sector);
            }
        }
        m
    };
}

/// Sector of `ticker` in the built-in table, if known.
pub fn builtin_sector(ticker: &str) -> Option<&'static str> {
    let sector = GICS_SECTORS.get(ticker).copied();
    if sector.is_none() {
        debug!(ticker, "Ticker not in built-in sector table");
    }
    sector
}

/// Supplies the `ticker -> sector` mapping to the scanner.
pub trait SectorSource: Send + Sync {
    fn get_sectors(&self) -> HashMap<String, String>;
}

/// The built-in GICS table.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticSectors;

impl SectorSource for StaticSectors {
    fn get_sectors(&self) -> HashMap<String, String> {
        GICS_SECTORS
            .iter()
            .map(|(t, s)| (t.to_string(), s.to_string()))
            .collect()
    }
}

/// A mapping loaded from a `ticker,sector` CSV file.
#[derive(Debug, Clone)]
pub struct CsvSectors {
    map: HashMap<String, String>,
}

#[derive(Deserialize)]
struct SectorRow {
    ticker: String,
    sector: String,
}

impl CsvSectors {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let mut reader = csv::Reader::from_path(path.as_ref())?;
        let mut map = HashMap::new();
        for row in reader.deserialize::<SectorRow>() {
            let row = row?;
            map.insert(row.ticker.trim().to_string(), row.sector.trim().to_string());
        }
        info!(
            path = %path.as_ref().display(),
            tickers = map.len(),
            "Loaded sector mapping"
        );
        Ok(Self { map })
    }
}

impl SectorSource for CsvSectors {
    fn get_sectors(&self) -> HashMap<String, String> {
        self.map.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(builtin_sector("XOM"), Some("Energy"));
        assert_eq!(builtin_sector("KO"), Some("Consumer Staples"));
        assert_eq!(builtin_sector("ZZZZ"), None);
        assert_eq!(StaticSectors.get_sectors().get("PLD").map(String::as_str), Some("Real Estate"));
    }

    #[test]
    fn test_csv_sectors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sectors.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "ticker,sector\nAAA, Widgets\nBBB,Gadgets").unwrap();
        let sectors = CsvSectors::load(&path).unwrap().get_sectors();
        assert_eq!(sectors["AAA"], "Widgets");
        assert_eq!(sectors.len(), 2);
    }
}
