//! Trailing z-score for the live tracker.

use crate::math::stats::{mean, sample_std};

/// Standard deviations below this are treated as zero.
pub const STD_FLOOR: f64 = 1e-8;

/// Z-score of the last spread value against the trailing `lookback` values.
///
/// The lookback shrinks to the available history. A degenerate window
/// (fewer than two points, or std below [`STD_FLOOR`]) yields 0.0.
pub fn live_zscore(spread: &[f64], lookback: usize) -> f64 {
    let lookback = lookback.min(spread.len());
    let window = &spread[spread.len() - lookback..];
    let (Some(last), Some(m), Some(s)) = (window.last(), mean(window), sample_std(window)) else {
        return 0.0;
    };
    if !s.is_finite() || s < STD_FLOOR {
        return 0.0;
    }
    (last - m) / s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uses_trailing_window_only() {
        // the leading outlier is outside the 3-point window
        let z = live_zscore(&[1000.0, 1.0, 2.0, 3.0], 3);
        assert!((z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_shrinks_to_available_history() {
        assert!((live_zscore(&[1.0, 2.0, 3.0], 60) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_windows_are_zero() {
        assert_eq!(live_zscore(&[], 60), 0.0);
        assert_eq!(live_zscore(&[5.0], 60), 0.0);
        assert_eq!(live_zscore(&[5.0, 5.0, 5.0], 60), 0.0);
    }
}
