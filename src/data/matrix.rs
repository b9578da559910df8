//! Time-indexed, ticker-columned close prices.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Range;
use tracing::debug;

use super::DataError;

/// Dense price table: rows are sessions in strictly increasing time order,
/// columns are tickers, cells are finite closes.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMatrix {
    index: Vec<DateTime<Utc>>,
    tickers: Vec<String>,
    /// Column-major storage, one `Vec` per ticker.
    columns: Vec<Vec<f64>>,
}

impl PriceMatrix {
    /// Builds a matrix from already clean columns.
    ///
    /// # Errors
    /// Rejects ragged columns, duplicate tickers, non-increasing timestamps and
    /// non-finite prices.
    pub fn new(
        index: Vec<DateTime<Utc>>,
        tickers: Vec<String>,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self, DataError> {
        if tickers.len() != columns.len() {
            return Err(DataError::InvalidMatrix(format!(
                "{} tickers but {} columns",
                tickers.len(),
                columns.len()
            )));
        }
        if let Some(bad) = columns.iter().position(|c| c.len() != index.len()) {
            return Err(DataError::InvalidMatrix(format!(
                "column {} has {} rows, index has {}",
                tickers[bad],
                columns[bad].len(),
                index.len()
            )));
        }
        if index.windows(2).any(|w| w[0] >= w[1]) {
            return Err(DataError::InvalidMatrix(
                "timestamps must be strictly increasing".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = tickers.iter().find(|t| !seen.insert(t.as_str())) {
            return Err(DataError::InvalidMatrix(format!("duplicate ticker {dup}")));
        }
        if columns.iter().flatten().any(|v| !v.is_finite()) {
            return Err(DataError::InvalidMatrix(
                "prices must be finite".to_string(),
            ));
        }
        Ok(Self {
            index,
            tickers,
            columns,
        })
    }

    /// Builds a clean matrix from possibly gappy columns.
    ///
    /// Rows are sorted by time (later duplicates of a timestamp win), duplicate
    /// tickers keep their first column, tickers without a single observation are
    /// dropped, and finally every row with a missing or non-finite cell is dropped.
    pub fn from_sparse(
        index: Vec<DateTime<Utc>>,
        tickers: Vec<String>,
        columns: Vec<Vec<Option<f64>>>,
    ) -> Result<Self, DataError> {
        if tickers.len() != columns.len() || columns.iter().any(|c| c.len() != index.len()) {
            return Err(DataError::InvalidMatrix(
                "ragged input to from_sparse".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let kept: Vec<usize> = (0..tickers.len())
            .filter(|&j| {
                let fresh = seen.insert(tickers[j].clone());
                if !fresh {
                    debug!(ticker = %tickers[j], "Dropping duplicate ticker column");
                }
                fresh && columns[j].iter().any(|v| v.is_some_and(f64::is_finite))
            })
            .collect();

        let mut order: BTreeMap<DateTime<Utc>, usize> = BTreeMap::new();
        for (row, ts) in index.iter().enumerate() {
            order.insert(*ts, row);
        }

        let mut out_index = Vec::with_capacity(order.len());
        let mut out_cols: Vec<Vec<f64>> = vec![Vec::with_capacity(order.len()); kept.len()];
        for (ts, row) in order {
            let cells: Option<Vec<f64>> = kept
                .iter()
                .map(|&j| columns[j][row].filter(|v| v.is_finite()))
                .collect();
            if let Some(cells) = cells {
                out_index.push(ts);
                for (col, v) in out_cols.iter_mut().zip(cells) {
                    col.push(v);
                }
            }
        }

        let out_tickers = kept.iter().map(|&j| tickers[j].clone()).collect();
        Self::new(out_index, out_tickers, out_cols)
    }

    /// Aligns per-ticker observation lists on their common timestamps.
    pub fn from_series(series: Vec<(String, Vec<(DateTime<Utc>, f64)>)>) -> Result<Self, DataError> {
        let mut all_ts: Vec<DateTime<Utc>> = series
            .iter()
            .flat_map(|(_, obs)| obs.iter().map(|(ts, _)| *ts))
            .collect();
        all_ts.sort();
        all_ts.dedup();
        let pos: HashMap<DateTime<Utc>, usize> =
            all_ts.iter().enumerate().map(|(i, ts)| (*ts, i)).collect();

        let mut tickers = Vec::with_capacity(series.len());
        let mut columns = Vec::with_capacity(series.len());
        for (ticker, obs) in series {
            let mut col = vec![None; all_ts.len()];
            for (ts, px) in obs {
                if let Some(&i) = pos.get(&ts) {
                    col[i] = Some(px);
                }
            }
            tickers.push(ticker);
            columns.push(col);
        }
        Self::from_sparse(all_ts, tickers, columns)
    }

    pub fn empty() -> Self {
        Self {
            index: Vec::new(),
            tickers: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Number of sessions (rows).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty() || self.tickers.is_empty()
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.tickers.iter().any(|t| t == ticker)
    }

    /// Full price history for `ticker`.
    pub fn column(&self, ticker: &str) -> Option<&[f64]> {
        self.tickers
            .iter()
            .position(|t| t == ticker)
            .map(|j| self.columns[j].as_slice())
    }

    /// Column by position, in `tickers()` order.
    pub fn column_at(&self, j: usize) -> &[f64] {
        &self.columns[j]
    }

    /// Most recent close for `ticker`.
    pub fn last_price(&self, ticker: &str) -> Option<f64> {
        self.column(ticker).and_then(|c| c.last().copied())
    }

    /// Sub-matrix over a row range, clipped to the available rows.
    pub fn slice_rows(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        Self {
            index: self.index[start..end].to_vec(),
            tickers: self.tickers.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| c[start..end].to_vec())
                .collect(),
        }
    }

    /// Last `n` rows.
    pub fn tail(&self, n: usize) -> Self {
        self.slice_rows(self.len().saturating_sub(n)..self.len())
    }

    /// Keeps the requested tickers that are present, in request order.
    pub fn select(&self, tickers: &[String]) -> Self {
        let mut seen = HashSet::new();
        let picks: Vec<usize> = tickers
            .iter()
            .filter(|t| seen.insert(t.as_str()))
            .filter_map(|t| self.tickers.iter().position(|x| x == t))
            .collect();
        Self {
            index: self.index.clone(),
            tickers: picks.iter().map(|&j| self.tickers[j].clone()).collect(),
            columns: picks.iter().map(|&j| self.columns[j].clone()).collect(),
        }
    }

    /// Rows whose timestamp lies in `[start, end)`.
    pub fn between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let lo = self.index.partition_point(|ts| *ts < start);
        let hi = self.index.partition_point(|ts| *ts < end);
        self.slice_rows(lo..hi)
    }
}
