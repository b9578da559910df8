//! Pair candidates produced by the scanner.

use serde::{Deserialize, Serialize};

/// A pair accepted by the scanner for one training window.
///
/// Leg order matters: the spread is `price_a - hedge_ratio * price_b`.
/// The optional diagnostics are filled by the sector-grouped scan only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairCandidate {
    pub ticker_a: String,
    pub ticker_b: String,
    /// Engle-Granger p-value
    pub coint_pvalue: f64,
    /// OLS slope of `price_a` on `price_b` (with intercept)
    pub hedge_ratio: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adf_pvalue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub half_life: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread_std: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_zscore: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r_squared: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
}

impl PairCandidate {
    pub fn new(ticker_a: impl Into<String>, ticker_b: impl Into<String>, coint_pvalue: f64, hedge_ratio: f64) -> Self {
        Self {
            ticker_a: ticker_a.into(),
            ticker_b: ticker_b.into(),
            coint_pvalue,
            hedge_ratio,
            adf_pvalue: None,
            half_life: None,
            spread_std: None,
            current_zscore: None,
            r_squared: None,
            score: None,
            sector: None,
        }
    }

    /// Column label used in signal tables, e.g. `"KO/PEP"`.
    pub fn label(&self) -> String {
        pair_label(&self.ticker_a, &self.ticker_b)
    }

    /// Spread series `a - h * b`.
    pub fn spread(&self, a: &[f64], b: &[f64]) -> Vec<f64> {
        spread(a, b, self.hedge_ratio)
    }
}

pub fn pair_label(a: &str, b: &str) -> String {
    format!("{a}/{b}")
}

pub fn spread(a: &[f64], b: &[f64], hedge_ratio: f64) -> Vec<f64> {
    a.iter().zip(b).map(|(pa, pb)| pa - hedge_ratio * pb).collect()
}

/// Composite ranking score for the sector-grouped scan.
///
/// Half-lives below one bar count as one bar.
pub fn composite_score(coint_p: f64, adf_p: f64, half_life: f64, r_squared: f64) -> f64 {
    0.3 * (1.0 - coint_p) + 0.3 * (1.0 - adf_p) + 0.2 * (1.0 / half_life.max(1.0)) + 0.2 * r_squared
}
