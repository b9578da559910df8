//! Batch signal generation over a price matrix.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{debug, warn};

use super::signal::{signal_path, SpreadSignal};
use crate::data::PriceMatrix;
use crate::discovery::PairCandidate;
use crate::math::stats::rolling_zscore;

/// Signals indexed like the source matrix, one column per pair label.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalTable {
    index: Vec<DateTime<Utc>>,
    labels: Vec<String>,
    /// Column-major, values in {-1, 0, +1}
    columns: Vec<Vec<i8>>,
}

impl SignalTable {
    pub fn new(index: Vec<DateTime<Utc>>, labels: Vec<String>, columns: Vec<Vec<i8>>) -> Self {
        Self {
            index,
            labels,
            columns,
        }
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column(&self, label: &str) -> Option<&[i8]> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|j| self.columns[j].as_slice())
    }

    pub fn get(&self, row: usize, label: &str) -> Option<i8> {
        self.column(label).and_then(|c| c.get(row).copied())
    }
}

/// Z-score state machine per pair over the full matrix.
///
/// Pairs whose legs are missing from `prices` are skipped. Each pair is
/// evaluated in strict chronological order; pairs run in parallel.
pub fn generate_signals(
    prices: &PriceMatrix,
    pairs: &[PairCandidate],
    zscore_lookback: usize,
    entry_z: f64,
    exit_z: f64,
) -> SignalTable {
    let present: Vec<&PairCandidate> = pairs
        .iter()
        .filter(|p| {
            let ok = prices.contains(&p.ticker_a) && prices.contains(&p.ticker_b);
            if !ok {
                warn!(pair = %p.label(), "Pair legs missing from price matrix, skipping");
            }
            ok
        })
        .collect();

    let columns: Vec<Vec<i8>> = present
        .par_iter()
        .map(|pair| {
            let (a, b) = match (prices.column(&pair.ticker_a), prices.column(&pair.ticker_b)) {
                (Some(a), Some(b)) => (a, b),
                _ => return vec![0; prices.len()],
            };
            let spread = pair.spread(a, b);
            let z = rolling_zscore(&spread, zscore_lookback);
            signal_path(&z, entry_z, exit_z)
                .into_iter()
                .map(SpreadSignal::as_i8)
                .collect()
        })
        .collect();

    let labels: Vec<String> = present.iter().map(|p| p.label()).collect();
    debug!(pairs = labels.len(), rows = prices.len(), "Generated signals");
    SignalTable::new(prices.index().to_vec(), labels, columns)
}
