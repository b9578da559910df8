//! Property-based tests for the pairs pipeline
//!
//! These tests use proptest to verify invariants of the scanner, the signal
//! state machine, the weight builder and the walk-forward engine across many
//! random inputs.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use statarb::backtest::{run_backtest, BacktestParams};
use statarb::data::PriceMatrix;
use statarb::discovery::{find_cointegrated_pairs, PairCandidate, ScannerConfig};
use statarb::portfolio::build_weights;
use statarb::strategy::{next_signal, signal_path, SignalTable, SpreadSignal};

fn dates(n: usize) -> Vec<DateTime<Utc>> {
    let start = Utc.with_ymd_and_hms(2021, 1, 4, 0, 0, 0).unwrap();
    (0..n).map(|i| start + Duration::days(i as i64)).collect()
}

/// Strictly positive price paths built from bounded log returns.
fn price_matrix(tickers: usize, returns: &[Vec<f64>]) -> PriceMatrix {
    let n = returns[0].len();
    let names: Vec<String> = (0..tickers).map(|j| format!("T{j}")).collect();
    let columns: Vec<Vec<f64>> = returns
        .iter()
        .take(tickers)
        .map(|r| {
            r.iter()
                .scan(100.0, |p, x| {
                    *p *= x.exp();
                    Some(*p)
                })
                .collect()
        })
        .collect();
    PriceMatrix::new(dates(n), names, columns).unwrap()
}

fn returns_strategy(tickers: usize, len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<Vec<f64>>> {
    len.prop_flat_map(move |n| {
        prop::collection::vec(prop::collection::vec(-0.03f64..0.03, n), tickers)
    })
}

fn z_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -5.0f64..5.0,
        1 => Just(f64::NAN),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Every accepted pair has a p-value strictly below the threshold and the
    /// result is sorted by ascending p-value.
    #[test]
    fn scanner_accepts_only_below_threshold(
        returns in returns_strategy(4, 60..120),
        threshold in 0.01f64..0.5,
    ) {
        let prices = price_matrix(4, &returns);
        let config = ScannerConfig {
            p_threshold: threshold,
            min_observations: 30,
            ..Default::default()
        };
        let pairs = find_cointegrated_pairs(&prices, &config);
        for p in &pairs {
            prop_assert!(p.coint_pvalue < threshold);
            prop_assert!(p.ticker_a != p.ticker_b);
        }
        for w in pairs.windows(2) {
            prop_assert!(w[0].coint_pvalue <= w[1].coint_pvalue);
        }
    }

    /// The walk-forward output has one row per trading date, strictly increasing.
    #[test]
    fn walk_forward_one_row_per_date(
        returns in returns_strategy(3, 90..140),
        train in 30usize..45,
        trade in 5usize..20,
        step in prop::option::of(3usize..25),
    ) {
        let prices = price_matrix(3, &returns);
        let mut params = BacktestParams::default();
        params.walk_forward.training_window = train;
        params.walk_forward.trading_window = trade;
        params.walk_forward.step = step;
        params.scanner.min_observations = 20;
        params.signal.zscore_lookback = 5;

        let rows = run_backtest(&prices, &params, None).unwrap();
        for w in rows.windows(2) {
            prop_assert!(w[0].date < w[1].date);
        }

        // union of trading segments
        let step = step.unwrap_or(trade);
        let mut covered = std::collections::BTreeSet::new();
        let mut offset = 0;
        while offset + train + trade <= prices.len() {
            covered.extend(offset + train..offset + train + trade);
            offset += step;
        }
        prop_assert_eq!(rows.len(), covered.len());
        prop_assert_eq!(rows[0].date, prices.index()[train]);
        for row in &rows {
            prop_assert!(row.portfolio_return.is_finite());
            prop_assert!(row.gross_leverage <= params.risk.max_gross_leverage + 1e-9);
        }
    }
}

proptest! {
    /// The state machine only moves at its thresholds.
    #[test]
    fn signal_transitions_respect_thresholds(
        zs in prop::collection::vec(z_strategy(), 1..200),
        entry in 1.0f64..3.0,
        exit_frac in 0.0f64..0.9,
    ) {
        let exit = entry * exit_frac;
        let path = signal_path(&zs, entry, exit);
        prop_assert_eq!(path.len(), zs.len());

        let mut prev = SpreadSignal::Flat;
        for (&z, &s) in zs.iter().zip(&path) {
            prop_assert!(matches!(s.as_i8(), -1 | 0 | 1));
            prop_assert_eq!(s, next_signal(prev, z, entry, exit));
            match (prev, s) {
                (SpreadSignal::Flat, SpreadSignal::LongSpread) => {
                    prop_assert!(z <= -entry)
                }
                (SpreadSignal::Flat, SpreadSignal::ShortSpread) => {
                    prop_assert!(z >= entry)
                }
                (open, SpreadSignal::Flat) if !open.is_flat() => {
                    prop_assert!(!z.is_finite() || z.abs() <= exit)
                }
                (SpreadSignal::LongSpread, SpreadSignal::ShortSpread)
                | (SpreadSignal::ShortSpread, SpreadSignal::LongSpread) => {
                    prop_assert!(false, "open position flipped without passing through flat")
                }
                _ => {}
            }
            prev = s;
        }
    }

    /// Every weight respects the position cap and every row the gross cap.
    #[test]
    fn weights_respect_caps(
        signals in prop::collection::vec(prop::collection::vec(-1i8..=1, 30), 1..6),
        hedges in prop::collection::vec(-3.0f64..3.0, 6),
        max_w in 0.01f64..0.5,
        lev_mult in 0.5f64..20.0,
    ) {
        let tickers = ["AAA", "BBB", "CCC", "DDD"];
        let pairs: Vec<PairCandidate> = signals
            .iter()
            .enumerate()
            .map(|(k, _)| {
                let a = tickers[k % 4];
                let b = tickers[(k + 1 + k / 4) % 4];
                let b = if a == b { tickers[(k + 2) % 4] } else { b };
                PairCandidate::new(a, b, 0.01, hedges[k])
            })
            .collect();
        let mut labels: Vec<String> = Vec::new();
        let mut columns: Vec<Vec<i8>> = Vec::new();
        for (pair, col) in pairs.iter().zip(&signals) {
            if !labels.contains(&pair.label()) {
                labels.push(pair.label());
                columns.push(col.clone());
            }
        }
        let table = SignalTable::new(dates(30), labels, columns);

        let max_lev = max_w * lev_mult;
        let weights = build_weights(&table, &pairs, max_w, max_lev);
        prop_assert_eq!(weights.len(), 30);
        for (i, row) in weights.rows().iter().enumerate() {
            for w in row {
                prop_assert!(w.abs() <= max_w + 1e-12);
            }
            prop_assert!(weights.gross(i) <= max_lev + 1e-9);
        }
    }
}
