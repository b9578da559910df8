//! Seeded synthetic prices for CI and offline runs.
//!
//! Tickers that share a GICS sector load on a common geometric random-walk
//! factor plus an Ornstein-Uhlenbeck idiosyncratic term, so same-sector names
//! are cointegrated by construction. Tickers without a sector get their own
//! factor. Every series depends only on the seed and the ticker (or sector)
//! name, so a ticker's path does not change with the rest of the request.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::collections::HashMap;
use tracing::debug;

use super::sector::builtin_sector;
use super::{DataError, PriceMatrix, PriceProvider, ProviderId};

/// First session of the synthetic calendar.
const EPOCH: (i32, u32, u32) = (2015, 1, 1);
const FACTOR_DRIFT: f64 = 0.0002;
const FACTOR_VOL: f64 = 0.012;
const OU_KAPPA: f64 = 0.15;
const OU_VOL: f64 = 0.8;

pub struct SyntheticProvider {
    seed: u64,
    recent_rows: usize,
}

fn name_seed(seed: u64, name: &str) -> u64 {
    // FNV-1a so the stream is stable across platforms and runs
    name.bytes().fold(0xcbf2_9ce4_8422_2325 ^ seed, |h, b| {
        (h ^ b as u64).wrapping_mul(0x0100_0000_01b3)
    })
}

fn business_days(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let mut out = Vec::new();
    let mut day = start;
    while day < end {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            out.push(day);
        }
        day += Duration::days(1);
    }
    out
}

impl SyntheticProvider {
    pub fn new(seed: u64, recent_rows: usize) -> Self {
        Self { seed, recent_rows }
    }

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(EPOCH.0, EPOCH.1, EPOCH.2, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    fn factor_path(&self, key: &str, n: usize) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(name_seed(self.seed, key));
        let mut level = 100.0 * rng.gen_range(0.5..2.0);
        let shock = Normal::new(FACTOR_DRIFT, FACTOR_VOL).ok();
        (0..n)
            .map(|_| {
                if let Some(d) = &shock {
                    level *= d.sample(&mut rng).exp();
                }
                level
            })
            .collect()
    }

    fn ticker_path(&self, ticker: &str, factor: &[f64]) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(name_seed(self.seed, ticker) ^ 0x5bd1_e995);
        let loading = rng.gen_range(0.5..1.5);
        let offset = rng.gen_range(5.0..25.0);
        let shock = Normal::new(0.0, OU_VOL).ok();
        let mut ou = 0.0;
        factor
            .iter()
            .map(|f| {
                if let Some(d) = &shock {
                    ou += -OU_KAPPA * ou + d.sample(&mut rng);
                }
                (offset + loading * f + ou).max(0.01)
            })
            .collect()
    }

    /// Full synthetic history from the epoch up to `end`.
    fn generate(&self, tickers: &[String], end: DateTime<Utc>) -> Result<PriceMatrix, DataError> {
        let index = business_days(Self::epoch(), end);
        let mut factors: HashMap<String, Vec<f64>> = HashMap::new();
        let mut series = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            let key = builtin_sector(ticker)
                .map(|s| format!("sector:{s}"))
                .unwrap_or_else(|| format!("ticker:{ticker}"));
            let factor = factors
                .entry(key.clone())
                .or_insert_with(|| self.factor_path(&key, index.len()));
            let path = self.ticker_path(ticker, factor);
            series.push((ticker.clone(), index.iter().copied().zip(path).collect()));
        }
        debug!(tickers = tickers.len(), sessions = index.len(), "Generated synthetic prices");
        PriceMatrix::from_series(series)
    }
}

#[async_trait]
impl PriceProvider for SyntheticProvider {
    async fn get_prices(
        &self,
        tickers: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceMatrix, DataError> {
        Ok(self.generate(tickers, end)?.between(start, end))
    }

    async fn fetch_recent_bars(&self, tickers: &[String]) -> Result<PriceMatrix, DataError> {
        Ok(self.generate(tickers, Utc::now())?.tail(self.recent_rows))
    }

    fn provider_id(&self) -> ProviderId {
        ProviderId::Synthetic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_deterministic_and_request_independent() {
        let p = SyntheticProvider::new(3, 50);
        let one = p
            .get_prices(&["KO".to_string()], ts(2020, 1, 1), ts(2021, 1, 1))
            .await
            .unwrap();
        let two = p
            .get_prices(&["PEP".to_string(), "KO".to_string()], ts(2020, 1, 1), ts(2021, 1, 1))
            .await
            .unwrap();
        assert_eq!(one.column("KO"), two.column("KO"));
        assert!(one.len() > 250 && one.len() < 265);
        assert!(two.column("PEP").unwrap().iter().all(|p| *p > 0.0));
    }

    #[test]
    fn test_business_days_skip_weekends() {
        // 2024-01-06 and 07 are a weekend
        let days = business_days(ts(2024, 1, 5), ts(2024, 1, 9));
        assert_eq!(days, vec![ts(2024, 1, 5), ts(2024, 1, 8)]);
    }
}
