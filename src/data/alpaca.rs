//! Alpaca market data provider for US equities.
//!
//! History uses daily bars, the live tick source uses one-minute bars over the
//! last few days. Requests go through a `governor` limiter because Alpaca
//! allows 200 requests per minute per key.

use apca::data::v2::bars as alpaca_bars;
use apca::{ApiInfo, Client};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use governor::{clock::DefaultClock, state::InMemoryState, Quota, RateLimiter};
use num_decimal::Num;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{DataError, PriceMatrix, PriceProvider, ProviderId};

const PAPER_URL: &str = "https://paper-api.alpaca.markets";
const LIVE_URL: &str = "https://api.alpaca.markets";
/// Bars per page, the API maximum.
const PAGE_LIMIT: usize = 10000;
/// Upper bound on pages per symbol and request.
const MAX_PAGES: usize = 50;

/// Bar granularity requested from the data API.
#[derive(Debug, Clone, Copy)]
enum BarSpan {
    Daily,
    Minute,
}

impl BarSpan {
    fn timeframe(self) -> alpaca_bars::TimeFrame {
        match self {
            BarSpan::Daily => alpaca_bars::TimeFrame::OneDay,
            BarSpan::Minute => alpaca_bars::TimeFrame::OneMinute,
        }
    }
}

type DirectLimiter = RateLimiter<governor::state::direct::NotKeyed, InMemoryState, DefaultClock>;

/// Builds an Alpaca client from `APCA_API_KEY_ID` / `APCA_API_SECRET_KEY`.
///
/// `APCA_API_BASE_URL` overrides the paper/live endpoint choice when set.
pub fn connect(paper: bool) -> Result<Client, DataError> {
    let key = std::env::var("APCA_API_KEY_ID")
        .map_err(|_| DataError::Configuration("APCA_API_KEY_ID must be set in environment".into()))?;
    let secret = std::env::var("APCA_API_SECRET_KEY").map_err(|_| {
        DataError::Configuration("APCA_API_SECRET_KEY must be set in environment".into())
    })?;
    let base_url = std::env::var("APCA_API_BASE_URL")
        .unwrap_or_else(|_| if paper { PAPER_URL } else { LIVE_URL }.to_string());

    info!(paper, base_url = %base_url, "Initializing Alpaca client");
    let api_info = ApiInfo::from_parts(base_url, key, secret)
        .map_err(|e| DataError::Configuration(format!("Failed to create Alpaca API info: {}", e)))?;
    Ok(Client::new(api_info))
}

/// Token for the next page, or `None` once the last page or the page cap is reached.
fn follow_page(next_page_token: Option<String>, pages: usize) -> Option<String> {
    let token = next_page_token?;
    if pages >= MAX_PAGES {
        warn!(pages, "Bar pagination cap reached, series truncated");
        return None;
    }
    Some(token)
}

/// One authenticated client shared by market data and order routing.
pub type SharedClient = Arc<RwLock<Client>>;

pub fn shared_client(paper: bool) -> Result<SharedClient, DataError> {
    Ok(Arc::new(RwLock::new(connect(paper)?)))
}

fn num_to_f64(n: &Num) -> Option<f64> {
    n.to_string().parse::<f64>().ok()
}

pub struct AlpacaProvider {
    client: SharedClient,
    rate_limiter: Arc<DirectLimiter>,
    recent_days: i64,
}

impl AlpacaProvider {
    /// Wraps an existing client so it can be shared with order execution.
    pub fn new(client: SharedClient, recent_days: i64) -> Self {
        const RATE_LIMIT_NZ: NonZeroU32 = match NonZeroU32::new(3) {
            Some(v) => v,
            None => panic!("RATE_LIMIT must be non-zero"),
        };
        Self {
            client,
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(RATE_LIMIT_NZ))),
            recent_days,
        }
    }

    pub fn from_env(paper: bool, recent_days: i64) -> Result<Self, DataError> {
        Ok(Self::new(shared_client(paper)?, recent_days))
    }

    /// Close prices for `symbol`, following `next_page_token` until the range is exhausted.
    async fn fetch_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        span: BarSpan,
    ) -> Result<Vec<(DateTime<Utc>, f64)>, DataError> {
        let mut request = alpaca_bars::ListReqInit {
            limit: Some(PAGE_LIMIT),
            ..Default::default()
        }
        .init(symbol, start, end, span.timeframe());

        let client = self.client.read().await;
        let mut closes: Vec<(DateTime<Utc>, f64)> = Vec::new();
        let mut pages = 0;
        loop {
            self.rate_limiter.until_ready().await;
            let page = client
                .issue::<alpaca_bars::List>(&request)
                .await
                .map_err(|e| DataError::Api(format!("Failed to fetch bars for {}: {}", symbol, e)))?;
            pages += 1;
            closes.extend(
                page.bars
                    .iter()
                    .filter_map(|bar| num_to_f64(&bar.close).map(|c| (bar.time, c))),
            );

            match follow_page(page.next_page_token, pages) {
                Some(token) => request.page_token = Some(token),
                None => break,
            }
        }
        debug!(symbol, pages, bars = closes.len(), "Fetched Alpaca bars");
        Ok(closes)
    }

    async fn fetch_matrix(
        &self,
        tickers: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        span: BarSpan,
    ) -> Result<PriceMatrix, DataError> {
        let mut series = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            // BRK-B style class shares are BRK.B on Alpaca
            let symbol = ticker.replace('-', ".");
            match self.fetch_bars(&symbol, start, end, span).await {
                Ok(closes) if !closes.is_empty() => series.push((ticker.clone(), closes)),
                Ok(_) => warn!(ticker = %ticker, "No bars returned, dropping ticker"),
                Err(e) => warn!(ticker = %ticker, error = %e, "Bar request failed, dropping ticker"),
            }
        }
        if series.is_empty() {
            return Err(DataError::Api("no ticker returned any bars".to_string()));
        }
        PriceMatrix::from_series(series)
    }
}

#[async_trait]
impl PriceProvider for AlpacaProvider {
    async fn get_prices(
        &self,
        tickers: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceMatrix, DataError> {
        info!(tickers = tickers.len(), start = %start, end = %end, "Downloading daily bars");
        self.fetch_matrix(tickers, start, end, BarSpan::Daily)
            .await
    }

    async fn fetch_recent_bars(&self, tickers: &[String]) -> Result<PriceMatrix, DataError> {
        let end = Utc::now();
        let start = end - Duration::days(self.recent_days);
        self.fetch_matrix(tickers, start, end, BarSpan::Minute)
            .await
    }

    fn provider_id(&self) -> ProviderId {
        ProviderId::Alpaca
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_to_f64() {
        let n: Num = "123.45".parse().unwrap();
        assert_eq!(num_to_f64(&n), Some(123.45));
    }

    #[test]
    fn test_follow_page_until_token_runs_out() {
        assert_eq!(follow_page(Some("abc".into()), 1).as_deref(), Some("abc"));
        assert_eq!(follow_page(None, 1), None);
        assert_eq!(follow_page(Some("abc".into()), MAX_PAGES), None);
    }
}
