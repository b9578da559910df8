//! Walk-forward orchestration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use super::{BacktestError, WalkForwardConfig};
use crate::data::PriceMatrix;
use crate::discovery::{find_pairs, ScannerConfig};
use crate::math::stats::pct_change;
use crate::portfolio::{build_weights, RiskConfig, WeightTable};
use crate::strategy::{generate_signals, SignalConfig};

/// One trading session of the stitched backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRow {
    pub date: DateTime<Utc>,
    pub portfolio_return: f64,
    pub gross_leverage: f64,
    pub net_exposure: f64,
    pub n_pairs: usize,
}

impl BacktestRow {
    fn flat(date: DateTime<Utc>) -> Self {
        Self {
            date,
            portfolio_return: 0.0,
            gross_leverage: 0.0,
            net_exposure: 0.0,
            n_pairs: 0,
        }
    }
}

/// Everything a walk-forward run needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BacktestParams {
    #[serde(default)]
    pub walk_forward: WalkForwardConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(default)]
    pub risk: RiskConfig,
}

impl BacktestParams {
    pub fn validate(&self) -> Result<(), BacktestError> {
        self.walk_forward
            .validate()
            .and_then(|_| self.scanner.validate())
            .and_then(|_| self.signal.validate())
            .and_then(|_| self.risk.validate())
            .map_err(BacktestError::InvalidConfig)
    }
}

/// Runs the walk-forward loop over `prices`.
///
/// Windows start at offset 0 and advance by the configured step while a full
/// training plus trading segment fits. A window without pairs contributes
/// zero rows. Overlapping windows resolve to the later window's row.
///
/// # Errors
/// `InvalidConfig` for bad parameters, `InsufficientData` when not even one
/// window fits, `NoResults` when nothing was produced.
pub fn run_backtest(
    prices: &PriceMatrix,
    params: &BacktestParams,
    sectors: Option<&HashMap<String, String>>,
) -> Result<Vec<BacktestRow>, BacktestError> {
    params.validate()?;
    let train = params.walk_forward.training_window;
    let trade = params.walk_forward.trading_window;
    let step = params.walk_forward.step();
    let total = prices.len();

    if train + trade > total {
        return Err(BacktestError::InsufficientData {
            needed: train + trade,
            available: total,
        });
    }

    let mut windows = Vec::new();
    let mut offset = 0;
    while offset + train + trade <= total {
        let training = prices.slice_rows(offset..offset + train);
        let trading = prices.slice_rows(offset + train..offset + train + trade);

        let pairs = find_pairs(&training, &params.scanner, sectors);
        let rows = if pairs.is_empty() {
            info!(offset, "No pairs found in training window, staying flat");
            trading.index().iter().copied().map(BacktestRow::flat).collect()
        } else {
            info!(
                offset,
                pairs = pairs.len(),
                start = %trading.index()[0].format("%Y-%m-%d"),
                "Trading window"
            );
            let signals = generate_signals(
                &trading,
                &pairs,
                params.signal.zscore_lookback,
                params.signal.entry_z,
                params.signal.exit_z,
            );
            let weights = build_weights(
                &signals,
                &pairs,
                params.risk.max_position_weight,
                params.risk.max_gross_leverage,
            );
            window_rows(&trading, &weights, pairs.len())
        };
        windows.push(rows);
        offset += step;
    }

    let rows = stitch(windows);
    if rows.is_empty() {
        return Err(BacktestError::NoResults);
    }
    info!(days = rows.len(), "Backtest complete");
    Ok(rows)
}

/// Daily rows for one trading segment.
///
/// The return on day t is the previous session's weights applied to day t's
/// simple returns, over the tickers present in both tables. Leverage and
/// exposure are those of the same day's weights.
pub(crate) fn window_rows(trading: &PriceMatrix, weights: &WeightTable, n_pairs: usize) -> Vec<BacktestRow> {
    let returns: Vec<(usize, Vec<f64>)> = weights
        .tickers()
        .iter()
        .enumerate()
        .filter_map(|(j, t)| trading.column(t).map(|c| (j, pct_change(c))))
        .collect();

    let rows = weights.rows();
    trading
        .index()
        .iter()
        .enumerate()
        .map(|(t, &date)| {
            let portfolio_return = if t == 0 {
                0.0
            } else {
                returns
                    .iter()
                    .map(|(j, r)| {
                        let contribution = rows[t - 1][*j] * r[t];
                        if contribution.is_finite() {
                            contribution
                        } else {
                            0.0
                        }
                    })
                    .sum()
            };
            BacktestRow {
                date,
                portfolio_return,
                gross_leverage: weights.gross(t),
                net_exposure: weights.net(t),
                n_pairs,
            }
        })
        .collect()
}

/// Concatenates window outputs, keeping the last row written for each date.
pub(crate) fn stitch(windows: Vec<Vec<BacktestRow>>) -> Vec<BacktestRow> {
    let mut by_date: BTreeMap<DateTime<Utc>, BacktestRow> = BTreeMap::new();
    for row in windows.into_iter().flatten() {
        if by_date.insert(row.date, row).is_some() {
            debug!("Overlapping window row replaced");
        }
    }
    by_date.into_values().collect()
}
