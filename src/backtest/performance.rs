//! Performance metrics over stitched backtest rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use super::BacktestRow;
use crate::math::stats::{mean, sample_covariance, sample_std};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Beta is only reported above this many overlapping dates.
const MIN_BETA_OVERLAP: usize = 10;

#[derive(Error, Debug, PartialEq)]
pub enum PerformanceError {
    #[error("Need at least 2 rows to compute metrics, got {0}")]
    TooFewRows(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub annualized_turnover: f64,
    pub avg_gross_leverage: f64,
    pub avg_pairs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    pub n_trading_days: usize,
}

/// Cumulative growth of one unit of capital, per row.
pub fn equity_curve(rows: &[BacktestRow]) -> Vec<(DateTime<Utc>, f64)> {
    rows.iter()
        .scan(1.0, |value, row| {
            *value *= 1.0 + row.portfolio_return;
            Some((row.date, *value))
        })
        .collect()
}

fn max_drawdown(curve: &[(DateTime<Utc>, f64)]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for &(_, value) in curve {
        peak = peak.max(value);
        if peak > 0.0 {
            worst = worst.min(value / peak - 1.0);
        }
    }
    worst
}

/// Computes the summary metrics.
///
/// `benchmark` holds daily benchmark returns keyed by date; beta uses only
/// dates present in both series. `risk_free_rate` is annual.
pub fn compute_metrics(
    rows: &[BacktestRow],
    benchmark: Option<&[(DateTime<Utc>, f64)]>,
    risk_free_rate: f64,
) -> Result<PerformanceReport, PerformanceError> {
    let n = rows.len();
    if n < 2 {
        return Err(PerformanceError::TooFewRows(n));
    }

    let returns: Vec<f64> = rows.iter().map(|r| r.portfolio_return).collect();
    let curve = equity_curve(rows);
    let total_return = curve.last().map_or(0.0, |(_, v)| v - 1.0);
    let annualized_return = (1.0 + total_return).powf(TRADING_DAYS_PER_YEAR / n as f64) - 1.0;

    let std = sample_std(&returns).unwrap_or(0.0);
    let annualized_volatility = std * TRADING_DAYS_PER_YEAR.sqrt();

    let daily_rf = (1.0 + risk_free_rate).powf(1.0 / TRADING_DAYS_PER_YEAR) - 1.0;
    let excess: Vec<f64> = returns.iter().map(|r| r - daily_rf).collect();
    let excess_std = sample_std(&excess).unwrap_or(0.0);
    let sharpe_ratio = if excess_std > 0.0 {
        mean(&excess).unwrap_or(0.0) / excess_std * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    let gross: Vec<f64> = rows.iter().map(|r| r.gross_leverage).collect();
    let turnover_changes: Vec<f64> = gross.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    let annualized_turnover = mean(&turnover_changes).unwrap_or(0.0) * TRADING_DAYS_PER_YEAR;

    let pairs: Vec<f64> = rows.iter().map(|r| r.n_pairs as f64).collect();

    Ok(PerformanceReport {
        total_return,
        annualized_return,
        annualized_volatility,
        sharpe_ratio,
        max_drawdown: max_drawdown(&curve),
        annualized_turnover,
        avg_gross_leverage: mean(&gross).unwrap_or(0.0),
        avg_pairs: mean(&pairs).unwrap_or(0.0),
        beta: benchmark.and_then(|b| beta(rows, b)),
        n_trading_days: n,
    })
}

fn beta(rows: &[BacktestRow], benchmark: &[(DateTime<Utc>, f64)]) -> Option<f64> {
    let bench: HashMap<DateTime<Utc>, f64> = benchmark
        .iter()
        .filter(|(_, r)| r.is_finite())
        .copied()
        .collect();
    let (strategy, market): (Vec<f64>, Vec<f64>) = rows
        .iter()
        .filter_map(|row| bench.get(&row.date).map(|&m| (row.portfolio_return, m)))
        .unzip();
    if strategy.len() <= MIN_BETA_OVERLAP {
        return None;
    }
    let var = sample_std(&market)?.powi(2);
    if var == 0.0 {
        return None;
    }
    Some(sample_covariance(&strategy, &market)? / var)
}
