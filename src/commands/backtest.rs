//! Walk-forward backtest command handler.
//!
//! Implements the `backtest` subcommand: loads prices, runs the rolling
//! scan/trade engine, and writes rows, metrics and the equity curve.

use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::info;

use super::{load_prices, load_sectors};
use crate::backtest::{self, compute_metrics, equity_curve, BacktestRow, PerformanceReport};
use crate::cli::BacktestCliConfig;
use crate::config::StatArbConfig;
use crate::discovery::ScanMode;
use crate::math::stats::pct_change;

pub const RESULTS_FILE: &str = "backtest_results.csv";
pub const METRICS_FILE: &str = "metrics.json";
pub const EQUITY_FILE: &str = "equity_curve.csv";

/// Daily benchmark returns keyed by date; the first session has none.
pub(crate) fn benchmark_returns(
    index: &[DateTime<Utc>],
    prices: &[f64],
) -> Vec<(DateTime<Utc>, f64)> {
    index
        .iter()
        .zip(pct_change(prices))
        .skip(1)
        .filter(|(_, r)| r.is_finite())
        .map(|(d, r)| (*d, r))
        .collect()
}

/// Writes the three result files into `dir`, creating it if needed.
pub(crate) fn write_results(
    dir: &Path,
    rows: &[BacktestRow],
    report: &PerformanceReport,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(dir)?;

    let mut writer = csv::Writer::from_path(dir.join(RESULTS_FILE))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    std::fs::write(dir.join(METRICS_FILE), serde_json::to_string_pretty(report)?)?;

    let mut writer = csv::Writer::from_path(dir.join(EQUITY_FILE))?;
    writer.write_record(["date", "equity"])?;
    for (date, value) in equity_curve(rows) {
        writer.write_record([date.format("%Y-%m-%d").to_string(), format!("{:.8}", value)])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_summary(report: &PerformanceReport, benchmark: Option<&str>) {
    let rule = "=".repeat(50);
    println!("\n{}", rule);
    println!("  BACKTEST PERFORMANCE SUMMARY");
    println!("{}", rule);
    let pct = |v: f64| format!("{:.2}%", v * 100.0);
    let beta_label = format!("Beta (vs {})", benchmark.unwrap_or("benchmark"));
    let lines = [
        ("Ann. Return", pct(report.annualized_return)),
        ("Ann. Volatility", pct(report.annualized_volatility)),
        ("Sharpe Ratio", format!("{:.3}", report.sharpe_ratio)),
        ("Max Drawdown", pct(report.max_drawdown)),
        ("Ann. Turnover", format!("{:.2}", report.annualized_turnover)),
        (
            beta_label.as_str(),
            report.beta.map_or("N/A".to_string(), |b| format!("{:.4}", b)),
        ),
        ("Total Return", pct(report.total_return)),
        ("Avg Gross Leverage", format!("{:.2}", report.avg_gross_leverage)),
        ("Avg Pairs", format!("{:.1}", report.avg_pairs)),
        ("Trading Days", report.n_trading_days.to_string()),
    ];
    for (label, value) in lines {
        println!("  {:.<30} {}", label, value);
    }
    println!("{}\n", rule);
}

/// Run the walk-forward backtest and report its performance.
///
/// # Errors
/// Returns error if data loading fails, no results are produced, or the
/// output files cannot be written.
pub async fn run_backtest(
    mut config: StatArbConfig,
    cli: BacktestCliConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    cli.apply(&mut config)?;
    config.validate()?;

    info!("--- StatArb: Walk-Forward Backtest ---");
    let loaded = load_prices(&config).await?;
    let sectors = match config.scanner.mode {
        ScanMode::SectorGrouped => Some(load_sectors(&config)?),
        ScanMode::AllPairs => None,
    };

    let params = config.backtest_params();
    info!(
        training_window = params.walk_forward.training_window,
        trading_window = params.walk_forward.trading_window,
        step = params.walk_forward.step(),
        mode = ?params.scanner.mode,
        "Running walk-forward backtest"
    );
    let rows = backtest::run_backtest(&loaded.assets, &params, sectors.as_ref())?;

    let bench = loaded
        .benchmark
        .as_deref()
        .map(|b| benchmark_returns(loaded.assets.index(), b));
    let report = compute_metrics(&rows, bench.as_deref(), config.universe.risk_free_rate)?;
    print_summary(&report, config.universe.benchmark.as_deref());

    write_results(&config.output_dir, &rows, &report)?;
    info!(
        rows = rows.len(),
        sharpe = format!("{:.3}", report.sharpe_ratio),
        total_return = format!("{:.2}%", report.total_return * 100.0),
        dir = %config.output_dir.display(),
        "Backtest results written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 3, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_benchmark_returns_skip_first_session() {
        let index = vec![day(1), day(2), day(3)];
        let r = benchmark_returns(&index, &[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert_eq!(r[0].0, day(2));
        assert!((r[0].1 - 0.10).abs() < 1e-12);
        assert!((r[1].1 + 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_write_results_creates_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("results");
        let rows: Vec<BacktestRow> = (1..=5)
            .map(|d| BacktestRow {
                date: day(d),
                portfolio_return: 0.01,
                gross_leverage: 0.2,
                net_exposure: 0.0,
                n_pairs: 1,
            })
            .collect();
        let report = compute_metrics(&rows, None, 0.0).unwrap();
        write_results(&out, &rows, &report).unwrap();

        let results = std::fs::read_to_string(out.join(RESULTS_FILE)).unwrap();
        assert_eq!(results.lines().count(), 6);
        let metrics: PerformanceReport =
            serde_json::from_str(&std::fs::read_to_string(out.join(METRICS_FILE)).unwrap()).unwrap();
        assert_eq!(metrics.n_trading_days, 5);
        let equity = std::fs::read_to_string(out.join(EQUITY_FILE)).unwrap();
        assert!(equity.starts_with("date,equity\n2023-03-01,1.01000000"));
    }
}
