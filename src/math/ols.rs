//! Ordinary least squares via the normal equations.
//!
//! Small, dense regressions only (a handful of columns, a few hundred rows),
//! so `(X'X)^-1 X'y` with `nalgebra` is accurate enough and keeps standard
//! errors available for the Dickey-Fuller t-statistic.

use nalgebra::{DMatrix, DVector};

use super::StatsError;

/// Result of an OLS fit.
#[derive(Debug, Clone)]
pub struct OlsFit {
    /// Coefficients in regressor column order.
    pub params: Vec<f64>,
    /// Standard errors of `params`.
    pub std_errors: Vec<f64>,
    /// Sum of squared residuals.
    pub ssr: f64,
    /// Coefficient of determination against the centered total sum of squares.
    pub r_squared: f64,
    pub nobs: usize,
    pub residuals: Vec<f64>,
}

impl OlsFit {
    /// t-statistic of coefficient `i`.
    pub fn t_value(&self, i: usize) -> f64 {
        self.params[i] / self.std_errors[i]
    }

    /// Gaussian log-likelihood at the fitted parameters.
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        -n / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0)
    }

    /// Akaike information criterion, counting every regressor as a parameter.
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.params.len() as f64
    }
}

/// Fits `y = X b + e` where `rows` holds the regressor rows of `X`.
pub fn ols(y: &[f64], rows: &[Vec<f64>]) -> Result<OlsFit, StatsError> {
    let n = y.len();
    let k = rows.first().map(|r| r.len()).unwrap_or(0);
    if n != rows.len() || k == 0 {
        return Err(StatsError::DimensionMismatch);
    }
    if n <= k {
        return Err(StatsError::InsufficientData {
            expected: k + 1,
            actual: n,
        });
    }
    if y.iter().chain(rows.iter().flatten()).any(|v| !v.is_finite()) {
        return Err(StatsError::NonFinite);
    }

    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    let x = DMatrix::from_row_slice(n, k, &flat);
    let y_vec = DVector::from_column_slice(y);

    // two constant columns (e.g. intercept plus a flat series) cannot be separated
    let constant_columns = (0..k)
        .filter(|&j| is_constant(x.column(j).iter().copied()))
        .count();
    if constant_columns > 1 {
        return Err(StatsError::Singular);
    }

    let xt = x.transpose();
    let xtx_inv = (&xt * &x).try_inverse().ok_or(StatsError::Singular)?;
    let beta = &xtx_inv * (&xt * &y_vec);
    let residuals = &y_vec - &x * &beta;
    let ssr = residuals.dot(&residuals);

    let dof = (n - k) as f64;
    let sigma2 = ssr / dof;
    let std_errors: Vec<f64> = (0..k).map(|i| (sigma2 * xtx_inv[(i, i)]).sqrt()).collect();
    if std_errors.iter().any(|s| !s.is_finite()) {
        return Err(StatsError::Singular);
    }

    let y_mean = y.iter().sum::<f64>() / n as f64;
    let tss: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let r_squared = if tss > 0.0 { 1.0 - ssr / tss } else { 0.0 };

    Ok(OlsFit {
        params: beta.iter().copied().collect(),
        std_errors,
        ssr,
        r_squared,
        nobs: n,
        residuals: residuals.iter().copied().collect(),
    })
}

fn is_constant(mut values: impl Iterator<Item = f64>) -> bool {
    match values.next() {
        Some(first) => {
            let tol = 1e-12 * first.abs().max(1.0);
            values.all(|v| (v - first).abs() <= tol)
        }
        None => true,
    }
}

/// Regresses `y` on `x` with an intercept. Returns the fit with params `[intercept, slope]`.
pub fn ols_with_intercept(y: &[f64], x: &[f64]) -> Result<OlsFit, StatsError> {
    if y.len() != x.len() {
        return Err(StatsError::DimensionMismatch);
    }
    let rows: Vec<Vec<f64>> = x.iter().map(|v| vec![1.0, *v]).collect();
    ols(y, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovers_exact_line() {
        let x: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 + 1.5 * v).collect();
        let fit = ols_with_intercept(&y, &x).unwrap();
        assert!((fit.params[0] - 3.0).abs() < 1e-9);
        assert!((fit.params[1] - 1.5).abs() < 1e-9);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_slope_matches_closed_form() {
        let x = [1.0, 2.0, 4.0, 7.0, 11.0];
        let y = [2.0, 2.5, 5.0, 7.5, 12.0];
        let mx = x.iter().sum::<f64>() / 5.0;
        let my = y.iter().sum::<f64>() / 5.0;
        let sxy: f64 = x.iter().zip(&y).map(|(a, b)| (a - mx) * (b - my)).sum();
        let sxx: f64 = x.iter().map(|a| (a - mx).powi(2)).sum();
        let fit = ols_with_intercept(&y, &x).unwrap();
        assert!((fit.params[1] - sxy / sxx).abs() < 1e-10);
    }

    #[test]
    fn test_constant_regressor_is_singular() {
        let x = vec![5.0; 20];
        let y: Vec<f64> = (0..20).map(|i| i as f64).collect();
        assert!(matches!(ols_with_intercept(&y, &x), Err(StatsError::Singular)));
    }

    #[test]
    fn test_too_few_rows() {
        let err = ols_with_intercept(&[1.0, 2.0], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, StatsError::InsufficientData { .. }));
    }
}
