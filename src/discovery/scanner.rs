//! Cointegration scanner.
//!
//! Two variants share the pair enumeration:
//! - [`find_cointegrated_pairs`]: every ticker pair, accepted on the Engle-Granger
//!   p-value alone, ranked by ascending p-value.
//! - [`scan_pairs`]: same-sector pairs only, with hedge-ratio bounds, spread ADF,
//!   half-life and a composite score, ranked by descending score and diversified
//!   with a per-sector cap.
//!
//! Pair tests run on the rayon pool. Results are collected in enumeration order
//! and sorted with a stable sort, so identical input gives identical output.

use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, info};

use super::candidate::{composite_score, spread, PairCandidate};
use super::config::{ScanMode, ScannerConfig};
use crate::data::{PriceMatrix, UNKNOWN_SECTOR};
use crate::math::stats::{mean, population_std};
use crate::math::{adf_test, engle_granger, half_life, Trend};

/// Trailing window for the snapshot z-score reported with each candidate.
const SNAPSHOT_LOOKBACK: usize = 60;
const MIN_SPREAD_STD: f64 = 1e-6;

struct PairJob<'a> {
    a: usize,
    b: usize,
    sector: Option<&'a str>,
}

/// Runs the scanner variant selected by `config.mode`.
///
/// `sectors` is only consulted by the sector-grouped variant; without it that
/// variant tests all pairs as a single group.
pub fn find_pairs(
    prices: &PriceMatrix,
    config: &ScannerConfig,
    sectors: Option<&HashMap<String, String>>,
) -> Vec<PairCandidate> {
    match config.mode {
        ScanMode::AllPairs => find_cointegrated_pairs(prices, config),
        ScanMode::SectorGrouped => scan_pairs(prices, sectors, config),
    }
}

/// Engle-Granger test over every unordered ticker pair.
pub fn find_cointegrated_pairs(prices: &PriceMatrix, config: &ScannerConfig) -> Vec<PairCandidate> {
    let n = prices.tickers().len();
    let jobs: Vec<PairJob> = (0..n)
        .flat_map(|a| (a + 1..n).map(move |b| PairJob { a, b, sector: None }))
        .collect();

    let mut pairs: Vec<PairCandidate> = jobs
        .par_iter()
        .map(|job| test_simple(prices, job, config))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect();

    pairs.sort_by(|x, y| {
        x.coint_pvalue
            .partial_cmp(&y.coint_pvalue)
            .unwrap_or(Ordering::Equal)
    });

    info!(
        tested = jobs.len(),
        accepted = pairs.len(),
        p_threshold = config.p_threshold,
        "All-pairs cointegration scan complete"
    );
    pairs
}

/// Sector-grouped scan with the stricter acceptance rules.
pub fn scan_pairs(
    prices: &PriceMatrix,
    sectors: Option<&HashMap<String, String>>,
    config: &ScannerConfig,
) -> Vec<PairCandidate> {
    // groups keep first-appearance order of their sector in the column list
    let mut groups: Vec<(Option<&str>, Vec<usize>)> = Vec::new();
    for (j, ticker) in prices.tickers().iter().enumerate() {
        let sector = sectors.map(|m| m.get(ticker).map(String::as_str).unwrap_or(UNKNOWN_SECTOR));
        match groups.iter_mut().find(|(s, _)| *s == sector) {
            Some((_, members)) => members.push(j),
            None => groups.push((sector, vec![j])),
        }
    }
    for (sector, members) in &groups {
        debug!(sector = sector.unwrap_or("all"), tickers = members.len(), "Sector group");
    }

    let jobs: Vec<PairJob> = groups
        .iter()
        .flat_map(|(sector, members)| {
            members.iter().enumerate().flat_map(move |(i, &a)| {
                members[i + 1..].iter().map(move |&b| PairJob {
                    a,
                    b,
                    sector: *sector,
                })
            })
        })
        .collect();

    let mut candidates: Vec<PairCandidate> = jobs
        .par_iter()
        .map(|job| test_strict(prices, job, config))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect();

    candidates.sort_by(|x, y| {
        y.score
            .unwrap_or(f64::NEG_INFINITY)
            .partial_cmp(&x.score.unwrap_or(f64::NEG_INFINITY))
            .unwrap_or(Ordering::Equal)
    });

    let found = candidates.len();
    let selected = if sectors.is_some() {
        diversify(candidates, config.max_per_sector, config.max_pairs)
    } else {
        candidates.into_iter().take(config.max_pairs).collect()
    };

    info!(
        tickers = prices.tickers().len(),
        sectors = groups.len(),
        tested = jobs.len(),
        candidates = found,
        selected = selected.len(),
        "Sector-grouped scan complete"
    );
    selected
}

/// Greedy single pass over score-sorted candidates keeping at most
/// `max_per_sector` per sector and `max_pairs` overall.
pub fn diversify(
    candidates: Vec<PairCandidate>,
    max_per_sector: usize,
    max_pairs: usize,
) -> Vec<PairCandidate> {
    let mut per_sector: HashMap<String, usize> = HashMap::new();
    let mut selected = Vec::new();
    for c in candidates {
        let key = c.sector.clone().unwrap_or_else(|| UNKNOWN_SECTOR.to_string());
        let count = per_sector.entry(key).or_insert(0);
        if *count >= max_per_sector {
            continue;
        }
        *count += 1;
        selected.push(c);
        if selected.len() >= max_pairs {
            break;
        }
    }
    selected
}

fn legs<'p>(prices: &'p PriceMatrix, job: &PairJob) -> (&'p str, &'p str, &'p [f64], &'p [f64]) {
    let tickers = prices.tickers();
    (
        &tickers[job.a],
        &tickers[job.b],
        prices.column_at(job.a),
        prices.column_at(job.b),
    )
}

fn test_simple(prices: &PriceMatrix, job: &PairJob, config: &ScannerConfig) -> Option<PairCandidate> {
    let (ta, tb, a, b) = legs(prices, job);
    if a.len() < config.min_observations {
        debug!(pair = format!("{}-{}", ta, tb), observations = a.len(), "Skipped: insufficient history");
        return None;
    }
    let res = match engle_granger(a, b) {
        Ok(res) => res,
        Err(e) => {
            debug!(pair = format!("{}-{}", ta, tb), error = %e, "Skipped: cointegration test failed");
            return None;
        }
    };
    if res.p_value >= config.p_threshold {
        return None;
    }
    let mut pair = PairCandidate::new(ta, tb, res.p_value, res.hedge_ratio);
    pair.r_squared = Some(res.r_squared);
    debug!(
        pair = %pair.label(),
        pvalue = format!("{:.4}", res.p_value),
        hedge_ratio = format!("{:.4}", res.hedge_ratio),
        "Cointegrated pair found"
    );
    Some(pair)
}

fn test_strict(prices: &PriceMatrix, job: &PairJob, config: &ScannerConfig) -> Option<PairCandidate> {
    let (ta, tb, a, b) = legs(prices, job);
    let pair_name = format!("{}-{}", ta, tb);
    if a.len() < config.min_observations {
        debug!(pair = %pair_name, observations = a.len(), "Skipped: insufficient history");
        return None;
    }

    let coint = engle_granger(a, b)
        .map_err(|e| debug!(pair = %pair_name, error = %e, "Rejected: cointegration test failed"))
        .ok()?;
    if coint.p_value >= config.p_threshold {
        debug!(pair = %pair_name, pvalue = coint.p_value, "Rejected: not cointegrated");
        return None;
    }

    let h = coint.hedge_ratio;
    if h.abs() < config.min_hedge_ratio || h.abs() > config.max_hedge_ratio {
        debug!(pair = %pair_name, hedge_ratio = h, "Rejected: unrealistic hedge ratio");
        return None;
    }

    let s = spread(a, b, h);
    let adf = adf_test(&s, Some(config.adf_max_lag), Trend::Constant)
        .map_err(|e| debug!(pair = %pair_name, error = %e, "Rejected: ADF failed"))
        .ok()?;
    if adf.p_value >= config.adf_pvalue {
        debug!(pair = %pair_name, adf_pvalue = adf.p_value, "Rejected: spread not stationary");
        return None;
    }

    let spread_std = population_std(&s)?;
    if spread_std < MIN_SPREAD_STD {
        debug!(pair = %pair_name, "Rejected: flat spread");
        return None;
    }

    let hl = half_life(&s)
        .map_err(|e| debug!(pair = %pair_name, error = %e, "Rejected: no mean reversion"))
        .ok()?;

    let lookback = SNAPSHOT_LOOKBACK.min(s.len() / 2).max(1);
    let recent = &s[s.len() - lookback..];
    let current_z = match (mean(recent), population_std(recent)) {
        (Some(m), Some(sd)) if sd > 0.0 => (s[s.len() - 1] - m) / sd,
        _ => 0.0,
    };

    let score = composite_score(coint.p_value, adf.p_value, hl, coint.r_squared);
    info!(
        pair = %pair_name,
        sector = job.sector.unwrap_or("-"),
        pvalue = format!("{:.4}", coint.p_value),
        adf_pvalue = format!("{:.4}", adf.p_value),
        half_life = format!("{:.1}", hl),
        score = format!("{:.4}", score),
        "Viable pair found"
    );

    Some(PairCandidate {
        ticker_a: ta.to_string(),
        ticker_b: tb.to_string(),
        coint_pvalue: coint.p_value,
        hedge_ratio: h,
        adf_pvalue: Some(adf.p_value),
        half_life: Some(hl),
        spread_std: Some(spread_std),
        current_zscore: Some(current_z),
        r_squared: Some(coint.r_squared),
        score: Some(score),
        sector: job.sector.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    /// Two cointegrated legs (`A` = 5 + 2 * `B` + noise) and an independent walk `C`.
    fn matrix(n: usize, seed: u64) -> PriceMatrix {
        let mut rng = StdRng::seed_from_u64(seed);
        let step = Normal::new(0.0, 1.0).unwrap();
        let noise = Normal::new(0.0, 1.0).unwrap();
        let (mut b, mut c) = (Vec::new(), Vec::new());
        let (mut lb, mut lc) = (100.0, 80.0);
        for _ in 0..n {
            lb += step.sample(&mut rng);
            lc += step.sample(&mut rng);
            b.push(lb);
            c.push(lc);
        }
        let a: Vec<f64> = b.iter().map(|v| 5.0 + 2.0 * v + noise.sample(&mut rng)).collect();
        let t0 = Utc.with_ymd_and_hms(2022, 1, 3, 0, 0, 0).unwrap();
        let index = (0..n).map(|i| t0 + Duration::days(i as i64)).collect();
        PriceMatrix::new(
            index,
            vec!["A".into(), "B".into(), "C".into()],
            vec![a, b, c],
        )
        .unwrap()
    }

    #[test]
    fn test_all_pairs_finds_cointegrated_legs() {
        let m = matrix(300, 1);
        let pairs = find_cointegrated_pairs(&m, &ScannerConfig::default());
        let ab = pairs.iter().find(|p| p.ticker_a == "A" && p.ticker_b == "B").unwrap();
        assert!((ab.hedge_ratio - 2.0).abs() < 0.1);
        assert!(pairs.iter().all(|p| p.coint_pvalue < 0.05));
        assert!(pairs.windows(2).all(|w| w[0].coint_pvalue <= w[1].coint_pvalue));
    }

    #[test]
    fn test_short_history_yields_nothing() {
        let m = matrix(80, 2);
        assert!(find_cointegrated_pairs(&m, &ScannerConfig::default()).is_empty());
    }

    #[test]
    fn test_sector_grouping_restricts_pairs() {
        let m = matrix(300, 3);
        let mut sectors = HashMap::new();
        sectors.insert("A".to_string(), "Staples".to_string());
        sectors.insert("B".to_string(), "Energy".to_string());
        sectors.insert("C".to_string(), "Energy".to_string());
        let cfg = ScannerConfig {
            mode: ScanMode::SectorGrouped,
            ..Default::default()
        };
        let pairs = find_pairs(&m, &cfg, Some(&sectors));
        assert!(pairs.iter().all(|p| p.ticker_a != "A"));
    }

    #[test]
    fn test_strict_scan_fills_diagnostics() {
        let m = matrix(300, 4);
        let cfg = ScannerConfig {
            mode: ScanMode::SectorGrouped,
            ..Default::default()
        };
        let pairs = scan_pairs(&m, None, &cfg);
        let ab = pairs.iter().find(|p| p.label() == "A/B").unwrap();
        assert!(ab.score.unwrap() > 0.5);
        assert!(ab.half_life.unwrap() > 0.0);
        assert!(ab.adf_pvalue.unwrap() < 0.05);
        assert!(ab.sector.is_none());
    }

    #[test]
    fn test_scan_is_deterministic() {
        let m = matrix(300, 5);
        let cfg = ScannerConfig::default();
        assert_eq!(find_cointegrated_pairs(&m, &cfg), find_cointegrated_pairs(&m, &cfg));
    }

    #[test]
    fn test_diversify_caps_sectors() {
        let mk = |a: &str, sector: &str, score: f64| {
            let mut p = PairCandidate::new(a, "X", 0.01, 1.0);
            p.sector = Some(sector.to_string());
            p.score = Some(score);
            p
        };
        let picked = diversify(
            vec![mk("A", "E", 0.9), mk("B", "E", 0.8), mk("C", "E", 0.7), mk("D", "F", 0.6)],
            2,
            10,
        );
        let names: Vec<&str> = picked.iter().map(|p| p.ticker_a.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "D"]);
        assert_eq!(diversify(picked, 2, 1).len(), 1);
    }

    fn two_legs(a: Vec<f64>, b: Vec<f64>) -> PriceMatrix {
        let t0 = Utc.with_ymd_and_hms(2022, 1, 3, 0, 0, 0).unwrap();
        let index = (0..a.len()).map(|i| t0 + Duration::days(i as i64)).collect();
        PriceMatrix::new(index, vec!["A".into(), "B".into()], vec![a, b]).unwrap()
    }

    fn random_walk(n: usize, start: f64, rng: &mut StdRng) -> Vec<f64> {
        let step = Normal::new(0.0, 1.0).unwrap();
        let mut level = start;
        (0..n)
            .map(|_| {
                level += step.sample(rng);
                level
            })
            .collect()
    }

    /// Trendless leg that oscillates fast enough to stay uncorrelated with slow drifts.
    fn oscillating(n: usize, rng: &mut StdRng) -> Vec<f64> {
        let noise = Normal::new(0.0, 0.5).unwrap();
        (0..n)
            .map(|t| {
                let phase = 2.0 * std::f64::consts::PI * t as f64 / 10.0;
                100.0 + 5.0 * phase.sin() + noise.sample(rng)
            })
            .collect()
    }

    fn accepts_all_pairs(m: &PriceMatrix) -> bool {
        find_cointegrated_pairs(m, &ScannerConfig::default())
            .iter()
            .any(|p| p.label() == "A/B")
    }

    #[test]
    fn test_strict_rejects_large_hedge_ratio() {
        let mut rng = StdRng::seed_from_u64(21);
        let noise = Normal::new(0.0, 1.0).unwrap();
        let b = random_walk(300, 100.0, &mut rng);
        let a: Vec<f64> = b.iter().map(|v| 20.0 * v + noise.sample(&mut rng)).collect();
        let m = two_legs(a, b);

        let loose = find_cointegrated_pairs(&m, &ScannerConfig::default());
        assert!(loose.iter().any(|p| p.hedge_ratio > 10.0));
        assert!(scan_pairs(&m, None, &ScannerConfig::default()).is_empty());
    }

    #[test]
    fn test_strict_rejects_small_hedge_ratio() {
        let mut rng = StdRng::seed_from_u64(22);
        let noise = Normal::new(0.0, 0.05).unwrap();
        let b = random_walk(300, 100.0, &mut rng);
        let a: Vec<f64> = b.iter().map(|v| 50.0 + 0.05 * v + noise.sample(&mut rng)).collect();
        let m = two_legs(a, b);

        let loose = find_cointegrated_pairs(&m, &ScannerConfig::default());
        assert!(loose.iter().any(|p| p.hedge_ratio.abs() < 0.1));
        assert!(scan_pairs(&m, None, &ScannerConfig::default()).is_empty());
    }

    #[test]
    fn test_strict_rejects_random_walk_spread() {
        let mut rng = StdRng::seed_from_u64(23);
        let step = Normal::new(0.3, 1.0).unwrap();
        let b = oscillating(300, &mut rng);
        let mut drift = 0.0;
        let a: Vec<f64> = b
            .iter()
            .map(|v| {
                drift += step.sample(&mut rng);
                50.0 + v + drift
            })
            .collect();
        let m = two_legs(a, b);
        assert!(scan_pairs(&m, None, &ScannerConfig::default()).is_empty());

        // the spread ADF still rejects once the Engle-Granger gate is opened
        let open_gate = ScannerConfig {
            p_threshold: 1.1,
            ..Default::default()
        };
        assert!(scan_pairs(&m, None, &open_gate).is_empty());
    }

    #[test]
    fn test_strict_rejects_constant_spread() {
        let mut rng = StdRng::seed_from_u64(24);
        let b = random_walk(300, 100.0, &mut rng);
        let a: Vec<f64> = b.iter().map(|v| 5.0 + 2.0 * v).collect();
        let m = two_legs(a, b);

        assert!(accepts_all_pairs(&m));
        assert!(scan_pairs(&m, None, &ScannerConfig::default()).is_empty());
    }

    #[test]
    fn test_strict_rejects_explosive_spread() {
        let mut rng = StdRng::seed_from_u64(25);
        let noise = Normal::new(0.0, 0.1).unwrap();
        let b = oscillating(300, &mut rng);
        let a: Vec<f64> = b
            .iter()
            .enumerate()
            .map(|(t, v)| 50.0 + v + (0.015 * t as f64).exp() + noise.sample(&mut rng))
            .collect();
        let m = two_legs(a, b);

        // only the half-life gate is left to reject it
        let open_gates = ScannerConfig {
            p_threshold: 1.1,
            adf_pvalue: 1.1,
            ..Default::default()
        };
        assert!(scan_pairs(&m, None, &open_gates).is_empty());
    }

    #[test]
    fn test_scan_pairs_caps_pairs_per_sector() {
        let mut rng = StdRng::seed_from_u64(26);
        let noise = Normal::new(0.0, 1.0).unwrap();
        let factor = random_walk(300, 100.0, &mut rng);
        let loadings = [1.0, 1.5, 2.0, 2.5, 3.0];
        let tickers: Vec<String> = (0..loadings.len()).map(|i| format!("T{i}")).collect();
        let columns: Vec<Vec<f64>> = loadings
            .iter()
            .map(|k| factor.iter().map(|f| 10.0 + k * f + noise.sample(&mut rng)).collect())
            .collect();
        let t0 = Utc.with_ymd_and_hms(2022, 1, 3, 0, 0, 0).unwrap();
        let index = (0..300).map(|i| t0 + Duration::days(i as i64)).collect();
        let m = PriceMatrix::new(index, tickers.clone(), columns).unwrap();
        let sectors: HashMap<String, String> =
            tickers.iter().map(|t| (t.clone(), "Tech".to_string())).collect();

        let uncapped = ScannerConfig {
            max_per_sector: 10,
            ..Default::default()
        };
        assert!(scan_pairs(&m, Some(&sectors), &uncapped).len() > 2);

        let capped = ScannerConfig {
            max_per_sector: 2,
            ..Default::default()
        };
        let pairs = scan_pairs(&m, Some(&sectors), &capped);
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|p| p.sector.as_deref() == Some("Tech")));
        assert!(pairs[0].score >= pairs[1].score);
    }
}
