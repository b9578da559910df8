//! Pair scan command handler.
//!
//! Implements the `scan` subcommand: runs the cointegration scanner over the
//! configured universe and writes the pair table consumed by `live`.

use std::collections::HashSet;
use tracing::{info, warn};

use super::{load_prices, load_sectors};
use crate::cli::ScanCliConfig;
use crate::config::StatArbConfig;
use crate::data::UNKNOWN_SECTOR;
use crate::discovery::{find_pairs, save_pair_configs, PairCandidate, PairConfig, ScanMode};

/// Per-pair allocation cap in percent of capital.
const MAX_ALLOCATION_PCT: f64 = 10.0;

/// Leg directions implied by the current z-score: a spread below its mean is
/// bought (long A, short B), one above it is sold.
pub(crate) fn direction(z: f64) -> (&'static str, &'static str) {
    if z < 0.0 {
        ("Long", "Short")
    } else {
        ("Short", "Long")
    }
}

/// Equal weight across `n` pairs, capped, rounded to one decimal.
pub(crate) fn equal_allocation_pct(n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    ((1000.0 / n as f64).round() / 10.0).min(MAX_ALLOCATION_PCT)
}

fn format_report(pairs: &[PairCandidate]) -> String {
    let mut lines = Vec::new();
    let rule = "=".repeat(60);
    lines.push(rule.clone());
    lines.push("  TOP STATISTICAL ARBITRAGE PAIRS".to_string());
    lines.push(rule.clone());

    let alloc = equal_allocation_pct(pairs.len());
    for (i, p) in pairs.iter().enumerate() {
        let z = p.current_zscore.unwrap_or(0.0);
        let (dir_a, dir_b) = direction(z);
        lines.push(String::new());
        lines.push(format!("PAIR {}: {} / {}", i + 1, p.ticker_a, p.ticker_b));
        lines.push(format!(
            "  Position: {} {} / {} {}",
            dir_a, p.ticker_a, dir_b, p.ticker_b
        ));
        lines.push(format!("  Portfolio Allocation: {:.1}%", alloc));
        lines.push(format!("  Hedge Ratio: {:.4}", p.hedge_ratio));
        lines.push(format!(
            "  Sector: {}",
            p.sector.as_deref().unwrap_or(UNKNOWN_SECTOR)
        ));
        match p.adf_pvalue {
            Some(adf) => lines.push(format!(
                "  Coint p-value: {:.4} | ADF p-value: {:.4}",
                p.coint_pvalue, adf
            )),
            None => lines.push(format!("  Coint p-value: {:.4}", p.coint_pvalue)),
        }
        if let Some(hl) = p.half_life {
            lines.push(format!("  Half-life: {:.1} bars | Current Z: {:+.2}", hl, z));
        }
        if let (Some(r2), Some(score)) = (p.r_squared, p.score) {
            lines.push(format!("  R²: {:.4} | Score: {:.4}", r2, score));
        }
    }

    let sectors: HashSet<&str> = pairs
        .iter()
        .map(|p| p.sector.as_deref().unwrap_or(UNKNOWN_SECTOR))
        .collect();
    lines.push(String::new());
    lines.push(rule.clone());
    lines.push("  PORTFOLIO SUMMARY".to_string());
    lines.push(rule.clone());
    lines.push(format!("  Number of pairs: {}", pairs.len()));
    lines.push(format!(
        "  Total gross exposure: {:.1}%",
        alloc * 2.0 * pairs.len() as f64
    ));
    lines.push("  Net exposure: ~0% (dollar neutral)".to_string());
    lines.push(format!("  Max allocation per pair: {:.0}%", MAX_ALLOCATION_PCT));
    lines.push(format!("  Sectors represented: {}", sectors.len()));
    lines.push(rule);
    lines.join("\n")
}

/// Run the scanner and persist the accepted pairs.
///
/// # Errors
/// Returns error if prices cannot be loaded or the pair table cannot be written.
pub async fn run_scan(
    mut config: StatArbConfig,
    cli: ScanCliConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    cli.apply(&mut config)?;
    config.validate()?;

    info!("--- StatArb: Cointegration Pair Scan ---");
    let loaded = load_prices(&config).await?;
    let sectors = match config.scanner.mode {
        ScanMode::SectorGrouped => Some(load_sectors(&config)?),
        ScanMode::AllPairs => None,
    };

    let pairs = find_pairs(&loaded.assets, &config.scanner, sectors.as_ref());
    if pairs.is_empty() {
        warn!("No cointegrated pairs found. Try widening the universe or relaxing thresholds.");
        return Ok(());
    }

    println!("{}", format_report(&pairs));

    let configs: Vec<PairConfig> = pairs.iter().map(PairConfig::from).collect();
    save_pair_configs(&config.live.pairs_file, &configs)?;
    info!(
        pairs = configs.len(),
        path = %config.live.pairs_file.display(),
        "Saved pair table"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_follows_zscore_sign() {
        assert_eq!(direction(-1.3), ("Long", "Short"));
        assert_eq!(direction(0.0), ("Short", "Long"));
        assert_eq!(direction(2.1), ("Short", "Long"));
    }

    #[test]
    fn test_equal_allocation_is_capped() {
        assert_eq!(equal_allocation_pct(0), 0.0);
        assert_eq!(equal_allocation_pct(3), 10.0);
        assert_eq!(equal_allocation_pct(12), 8.3);
    }

    #[test]
    fn test_report_lists_every_pair() {
        let mut a = PairCandidate::new("KO", "PEP", 0.01, 0.8);
        a.sector = Some("Consumer Staples".into());
        a.current_zscore = Some(-2.2);
        let b = PairCandidate::new("XOM", "CVX", 0.03, 1.1);
        let report = format_report(&[a, b]);
        assert!(report.contains("PAIR 1: KO / PEP"));
        assert!(report.contains("Position: Long KO / Short PEP"));
        assert!(report.contains("PAIR 2: XOM / CVX"));
        assert!(report.contains("Sectors represented: 2"));
    }
}
