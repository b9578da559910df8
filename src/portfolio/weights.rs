//! Signal table to per-ticker portfolio weights.

use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::discovery::PairCandidate;
use crate::strategy::SignalTable;

/// Per-session weights, one column per ticker (sorted), one row per session.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    index: Vec<DateTime<Utc>>,
    tickers: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl WeightTable {
    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, row: usize, ticker: &str) -> Option<f64> {
        let j = self.tickers.iter().position(|t| t == ticker)?;
        self.rows.get(row).map(|r| r[j])
    }

    /// Sum of |weight| for one session.
    pub fn gross(&self, row: usize) -> f64 {
        self.rows.get(row).map_or(0.0, |r| r.iter().map(|w| w.abs()).sum())
    }

    /// Sum of signed weights for one session.
    pub fn net(&self, row: usize) -> f64 {
        self.rows.get(row).map_or(0.0, |r| r.iter().sum())
    }
}

/// Accumulates leg weights from every pair signal, clips each cell to
/// `max_position_weight`, then scales rows whose gross exceeds
/// `max_gross_leverage`. Rows are never scaled up.
pub fn build_weights(
    signals: &SignalTable,
    pairs: &[PairCandidate],
    max_position_weight: f64,
    max_gross_leverage: f64,
) -> WeightTable {
    let active: Vec<&PairCandidate> = pairs
        .iter()
        .filter(|p| signals.column(&p.label()).is_some())
        .collect();

    let tickers: Vec<String> = active
        .iter()
        .flat_map(|p| [p.ticker_a.clone(), p.ticker_b.clone()])
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let position: HashMap<&str, usize> = tickers
        .iter()
        .enumerate()
        .map(|(j, t)| (t.as_str(), j))
        .collect();

    let mut rows = vec![vec![0.0; tickers.len()]; signals.len()];
    for pair in &active {
        let (Some(col), Some(&ja), Some(&jb)) = (
            signals.column(&pair.label()),
            position.get(pair.ticker_a.as_str()),
            position.get(pair.ticker_b.as_str()),
        ) else {
            continue;
        };
        for (row, &s) in rows.iter_mut().zip(col) {
            let s = f64::from(s);
            row[ja] += s * max_position_weight;
            row[jb] -= s * pair.hedge_ratio * max_position_weight;
        }
    }

    let mut scaled = 0usize;
    for row in &mut rows {
        for w in row.iter_mut() {
            *w = w.clamp(-max_position_weight, max_position_weight);
        }
        let gross: f64 = row.iter().map(|w| w.abs()).sum();
        let scale = if gross > 0.0 {
            (max_gross_leverage / gross).min(1.0)
        } else {
            1.0
        };
        if scale < 1.0 {
            scaled += 1;
            for w in row.iter_mut() {
                *w *= scale;
            }
        }
    }
    debug!(tickers = tickers.len(), rows = rows.len(), scaled_rows = scaled, "Built weights");

    WeightTable {
        index: signals.index().to_vec(),
        tickers,
        rows,
    }
}
