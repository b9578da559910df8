//! Descriptive statistics over `f64` slices.
//!
//! NaN is used as the "undefined" marker for rolling outputs, mirroring how
//! a leading window is reported before it has filled.

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). `None` below two points.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Population standard deviation (n denominator). `None` for an empty slice.
pub fn population_std(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / values.len() as f64).sqrt())
}

/// Sample covariance of two equally long series. `None` below two points.
pub fn sample_covariance(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;
    let s: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    Some(s / (x.len() - 1) as f64)
}

/// First differences: `out[i] = values[i + 1] - values[i]`.
pub fn diff(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Simple percentage change. The first element is NaN.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(f64::NAN);
    for w in values.windows(2) {
        out.push(w[1] / w[0] - 1.0);
    }
    out
}

/// Rolling z-score of each value against its trailing `window` (inclusive).
///
/// Entries are NaN until the window fills, and wherever the window's sample
/// standard deviation is zero or non-finite.
pub fn rolling_zscore(values: &[f64], window: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if window < 2 {
        return out;
    }
    for end in window..=values.len() {
        let slice = &values[end - window..end];
        if let (Some(m), Some(s)) = (mean(slice), sample_std(slice)) {
            if s > 0.0 && s.is_finite() {
                out[end - 1] = (values[end - 1] - m) / s;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_vs_population_std() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((population_std(&v).unwrap() - 2.0).abs() < 1e-12);
        assert!((sample_std(&v).unwrap() - 2.138_089_935_299_395).abs() < 1e-12);
        assert!(sample_std(&[1.0]).is_none());
    }

    #[test]
    fn test_pct_change_leading_nan() {
        let r = pct_change(&[100.0, 102.0, 96.9]);
        assert!(r[0].is_nan());
        assert!((r[1] - 0.02).abs() < 1e-12);
        assert!((r[2] + 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_rolling_zscore_leading_and_flat_windows() {
        let z = rolling_zscore(&[1.0, 1.0, 1.0, 2.0, 3.0], 3);
        assert!(z[0].is_nan() && z[1].is_nan());
        // window [1, 1, 1] has zero variance
        assert!(z[2].is_nan());
        // window [1, 1, 2]: mean 4/3, sample std 0.57735
        assert!((z[3] - 1.154_700_538_379_251_5).abs() < 1e-9);
        assert!(z[4].is_finite());
    }

    #[test]
    fn test_covariance_matches_variance() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let var = sample_std(&x).unwrap().powi(2);
        assert!((sample_covariance(&x, &x).unwrap() - var).abs() < 1e-12);
    }
}
