//! Engle-Granger cointegration and mean-reversion diagnostics.

use tracing::warn;

use super::adf::{adf_with_series_count, Trend};
use super::ols::ols_with_intercept;
use super::StatsError;

/// Outcome of the two-step Engle-Granger test of `a` on `b`.
#[derive(Debug, Clone)]
pub struct CointResult {
    /// ADF statistic of the cointegrating-regression residuals.
    pub statistic: f64,
    pub p_value: f64,
    /// OLS slope of `a` on `b`.
    pub hedge_ratio: f64,
    pub intercept: f64,
    /// R-squared of the cointegrating regression.
    pub r_squared: f64,
}

/// Engle-Granger test: regress `a` on `b` with an intercept, then test the
/// residuals for a unit root (no deterministic terms, automatic lag order).
///
/// Near-perfectly collinear inputs skip the residual test and report a p-value
/// of zero, since the residual is numerically flat.
pub fn engle_granger(a: &[f64], b: &[f64]) -> Result<CointResult, StatsError> {
    let fit = ols_with_intercept(a, b)?;
    let hedge_ratio = fit.params[1];
    let intercept = fit.params[0];

    let collinear_bound = 1.0 - 100.0 * f64::EPSILON.sqrt();
    let statistic = if fit.r_squared < collinear_bound {
        adf_with_series_count(&fit.residuals, None, Trend::None, 2)?.statistic
    } else {
        warn!(
            r_squared = fit.r_squared,
            "Series are almost perfectly collinear, residual test skipped"
        );
        f64::NEG_INFINITY
    };

    Ok(CointResult {
        statistic,
        p_value: super::mackinnon::mackinnon_p(statistic, 2),
        hedge_ratio,
        intercept,
        r_squared: fit.r_squared,
    })
}

/// Half-life of a mean-reverting process with AR(1) coefficient `beta` on the lagged level.
pub fn half_life_from_beta(beta: f64) -> Result<f64, StatsError> {
    if beta >= 0.0 || !beta.is_finite() {
        return Err(StatsError::NotMeanReverting { beta });
    }
    Ok(-std::f64::consts::LN_2 / beta)
}

/// Estimates the spread half-life by regressing `spread[t] - spread[t-1]` on `spread[t-1]`.
pub fn half_life(spread: &[f64]) -> Result<f64, StatsError> {
    if spread.len() < 3 {
        return Err(StatsError::InsufficientData {
            expected: 3,
            actual: spread.len(),
        });
    }
    let lagged = &spread[..spread.len() - 1];
    let delta: Vec<f64> = spread.windows(2).map(|w| w[1] - w[0]).collect();
    let fit = ols_with_intercept(&delta, lagged)?;
    half_life_from_beta(fit.params[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    #[test]
    fn test_half_life_of_known_beta() {
        let hl = half_life_from_beta(-0.1).unwrap();
        assert!((hl - 6.931_471_805_599_453).abs() < 1e-12);
    }

    #[test]
    fn test_half_life_from_exact_ar1_path() {
        // s[t+1] = 0.9 * s[t] + 2.0, so ds = 2.0 - 0.1 * s exactly
        let mut s = vec![50.0];
        for _ in 0..60 {
            let last = *s.last().unwrap();
            s.push(0.9 * last + 2.0);
        }
        let hl = half_life(&s).unwrap();
        assert!((hl - 6.931_471_805_599_453).abs() < 1e-6, "hl = {hl}");
    }

    #[test]
    fn test_trending_spread_is_not_mean_reverting() {
        let s: Vec<f64> = (0..50).map(|i| 1.05f64.powi(i)).collect();
        assert!(matches!(
            half_life(&s),
            Err(StatsError::NotMeanReverting { .. })
        ));
    }

    #[test]
    fn test_cointegrated_pair_detected() {
        let mut rng = StdRng::seed_from_u64(42);
        let step = Normal::new(0.0, 1.0).unwrap();
        let noise = Normal::new(0.0, 0.5).unwrap();
        let mut b = Vec::with_capacity(250);
        let mut level = 50.0;
        for _ in 0..250 {
            level += step.sample(&mut rng);
            b.push(level);
        }
        let a: Vec<f64> = b.iter().map(|v| 10.0 + 1.5 * v + noise.sample(&mut rng)).collect();

        let res = engle_granger(&a, &b).unwrap();
        assert!(res.p_value < 0.01, "p = {}", res.p_value);
        assert!((res.hedge_ratio - 1.5).abs() < 0.1);
    }

    #[test]
    fn test_constant_leg_is_an_error() {
        let a: Vec<f64> = (0..120).map(|i| i as f64).collect();
        let b = vec![3.0; 120];
        assert!(engle_granger(&a, &b).is_err());
    }
}
