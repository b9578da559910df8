//! Augmented Dickey-Fuller unit-root test.
//!
//! Regression: `dy_t = [c +] g * y_{t-1} + sum_i d_i * dy_{t-i} + e_t`. The lag
//! order is chosen by minimum AIC over a common sample, then the test regression
//! is refit on the longest sample that lag order allows. The statistic is the
//! t-value on `g`.

use super::mackinnon::mackinnon_p;
use super::ols::{ols, OlsFit};
use super::stats::diff;
use super::StatsError;

/// Deterministic terms in the test regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    /// No deterministic terms (used on regression residuals).
    None,
    /// Constant only.
    Constant,
}

impl Trend {
    fn n_terms(self) -> usize {
        match self {
            Trend::None => 0,
            Trend::Constant => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdfResult {
    pub statistic: f64,
    pub p_value: f64,
    pub used_lag: usize,
    pub nobs: usize,
}

/// Default maximum lag: `ceil(12 * (n / 100)^(1/4))`.
pub fn default_max_lag(nobs: usize) -> usize {
    (12.0 * (nobs as f64 / 100.0).powf(0.25)).ceil() as usize
}

/// Builds the regression for `lag` lagged differences using rows `start..dx.len()`.
fn design(
    x: &[f64],
    dx: &[f64],
    start: usize,
    lag: usize,
    trend: Trend,
) -> (Vec<f64>, Vec<Vec<f64>>) {
    let mut y = Vec::with_capacity(dx.len() - start);
    let mut rows = Vec::with_capacity(dx.len() - start);
    for t in start..dx.len() {
        y.push(dx[t]);
        let mut row = Vec::with_capacity(1 + lag + trend.n_terms());
        row.push(x[t]);
        row.extend((1..=lag).map(|i| dx[t - i]));
        if trend == Trend::Constant {
            row.push(1.0);
        }
        rows.push(row);
    }
    (y, rows)
}

/// Runs the ADF test on `series`.
///
/// `max_lag` is capped so the regression keeps enough degrees of freedom; `None`
/// uses [`default_max_lag`]. The p-value is MacKinnon's for a single series.
pub fn adf_test(
    series: &[f64],
    max_lag: Option<usize>,
    trend: Trend,
) -> Result<AdfResult, StatsError> {
    adf_with_series_count(series, max_lag, trend, 1)
}

/// ADF test whose p-value is looked up for `n_series` series (Engle-Granger residuals use 2).
pub(crate) fn adf_with_series_count(
    series: &[f64],
    max_lag: Option<usize>,
    trend: Trend,
    n_series: usize,
) -> Result<AdfResult, StatsError> {
    let nobs = series.len();
    let floor = trend.n_terms() + 1;
    if nobs / 2 <= floor {
        return Err(StatsError::InsufficientData {
            expected: 2 * (floor + 1),
            actual: nobs,
        });
    }
    let cap = nobs / 2 - floor;
    let max_lag = max_lag.unwrap_or_else(|| default_max_lag(nobs)).min(cap);

    let dx = diff(series);

    let mut best: Option<(f64, usize)> = None;
    for lag in 0..=max_lag {
        let (y, rows) = design(series, &dx, max_lag, lag, trend);
        let fit = match ols(&y, &rows) {
            Ok(fit) => fit,
            Err(_) => continue,
        };
        let aic = fit.aic();
        if !aic.is_finite() {
            continue;
        }
        if best.map_or(true, |(b, _)| aic < b) {
            best = Some((aic, lag));
        }
    }
    let (_, used_lag) = best.ok_or(StatsError::Singular)?;

    let (y, rows) = design(series, &dx, used_lag, used_lag, trend);
    let fit: OlsFit = ols(&y, &rows)?;
    let statistic = fit.t_value(0);
    if statistic.is_nan() {
        return Err(StatsError::NonFinite);
    }

    Ok(AdfResult {
        statistic,
        p_value: mackinnon_p(statistic, n_series),
        used_lag,
        nobs: fit.nobs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 1.0).unwrap();
        (0..n).map(|_| normal.sample(&mut rng)).collect()
    }

    #[test]
    fn test_white_noise_is_stationary() {
        let res = adf_test(&noise(300, 7), Some(20), Trend::Constant).unwrap();
        assert!(res.p_value < 0.01, "p = {}", res.p_value);
    }

    #[test]
    fn test_random_walk_is_not_stationary() {
        let walk: Vec<f64> = noise(300, 11)
            .iter()
            .scan(100.0, |acc, e| {
                *acc += e;
                Some(*acc)
            })
            .collect();
        let res = adf_test(&walk, Some(20), Trend::Constant).unwrap();
        let stationary = adf_test(&noise(300, 7), Some(20), Trend::Constant).unwrap();
        assert!(res.statistic > stationary.statistic);
        assert!(res.p_value > 0.001, "p = {}", res.p_value);
    }

    #[test]
    fn test_short_series_rejected() {
        assert!(adf_test(&[1.0, 2.0, 1.5], None, Trend::Constant).is_err());
    }

    #[test]
    fn test_max_lag_is_capped() {
        let res = adf_test(&noise(30, 3), Some(50), Trend::Constant).unwrap();
        assert!(res.used_lag <= 30 / 2 - 2);
    }
}
