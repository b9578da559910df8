//! Live signal tracker: one poll loop over the configured pairs.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::position::{PairPosition, TradeAction};
use super::sizing::Sizer;
use super::zscore::live_zscore;
use super::LiveConfig;
use crate::data::PriceProvider;
use crate::discovery::candidate::spread;
use crate::discovery::PairConfig;
use crate::execution::{route_action, Executor};
use crate::logging::{SignalRecord, SignalRecorder};
use crate::metrics::{self, ACTIVE_PAIRS};
use crate::state::{PositionBook, PositionSnapshot};
use crate::strategy::SpreadSignal;
use crate::types::Clock;

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub timestamp: Option<DateTime<Utc>>,
    /// False when the fetch failed or returned no rows
    pub fetched: bool,
    /// Latest z-score of every pair whose legs were present
    pub zscores: Vec<(String, f64)>,
    pub actions: Vec<TradeAction>,
    pub active_pairs: usize,
    /// Fraction of capital deployed across both legs of active pairs
    pub gross_allocation: f64,
}

pub struct LiveTracker {
    config: LiveConfig,
    positions: Vec<PairPosition>,
    tickers: Vec<String>,
    provider: Arc<dyn PriceProvider>,
    executor: Arc<dyn Executor>,
    recorder: Arc<dyn SignalRecorder>,
    clock: Arc<dyn Clock>,
    sizer: Sizer,
    book: PositionBook,
    book_path: Option<PathBuf>,
}

impl LiveTracker {
    /// One flat position per configured pair; duplicate labels keep the first entry.
    pub fn new(
        pairs: &[PairConfig],
        config: LiveConfig,
        provider: Arc<dyn PriceProvider>,
        executor: Arc<dyn Executor>,
        recorder: Arc<dyn SignalRecorder>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut positions: Vec<PairPosition> = Vec::with_capacity(pairs.len());
        for pair in pairs {
            if positions.iter().any(|p| p.label() == pair.label()) {
                warn!(pair = %pair.label(), "Duplicate pair in configuration, ignoring");
                continue;
            }
            positions.push(PairPosition::new(pair));
        }

        let mut tickers: Vec<String> = Vec::new();
        for p in &positions {
            for t in [&p.ticker_a, &p.ticker_b] {
                if !tickers.contains(t) {
                    tickers.push(t.clone());
                }
            }
        }

        let sizer = Sizer::new(config.total_capital, config.alloc_per_pair);
        Self {
            config,
            positions,
            tickers,
            provider,
            executor,
            recorder,
            clock,
            sizer,
            book: PositionBook::default(),
            book_path: None,
        }
    }

    /// Persists positions to `path` after every tick and restores any saved
    /// state for the configured pairs now. Flat entries for pairs that are no
    /// longer configured are dropped from the book.
    pub fn with_position_book(mut self, path: PathBuf) -> Self {
        let mut book = PositionBook::load(&path);
        let labels: Vec<String> = self.positions.iter().map(PairPosition::label).collect();
        let pruned = book.retain_configured(&labels);
        if pruned > 0 {
            info!(pruned, path = %path.display(), "Dropped unconfigured flat pairs from position book");
        }
        let mut restored = 0;
        for position in &mut self.positions {
            if let Some(snapshot) = book.get(&position.label()) {
                snapshot.restore_into(position);
                if position.is_active() {
                    restored += 1;
                }
            }
        }
        if restored > 0 {
            info!(restored, path = %path.display(), "Restored open spreads from position book");
        }
        self.book = book;
        self.book_path = Some(path);
        self
    }

    pub fn positions(&self) -> &[PairPosition] {
        &self.positions
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Fetch, update every pair, dispatch actions, persist.
    ///
    /// Collaborator failures are logged and never propagate.
    pub async fn tick(&mut self) -> TickReport {
        let now = self.clock.now();
        let mut report = TickReport {
            timestamp: Some(now),
            ..Default::default()
        };

        let started = Instant::now();
        let bars = match self.provider.fetch_recent_bars(&self.tickers).await {
            Ok(bars) => bars,
            Err(e) => {
                warn!(error = %e, "Failed to fetch recent bars, skipping tick");
                metrics::record_tick("fetch_failed");
                return report;
            }
        };
        metrics::record_fetch_latency(
            &self.provider.provider_id().to_string(),
            started.elapsed().as_secs_f64(),
        );
        if bars.is_empty() {
            warn!("Recent bars are empty, skipping tick");
            metrics::record_tick("empty");
            return report;
        }
        report.fetched = true;

        for position in &mut self.positions {
            let label = position.label();
            let (Some(a), Some(b)) = (bars.column(&position.ticker_a), bars.column(&position.ticker_b)) else {
                debug!(pair = %label, "Legs missing from recent bars");
                continue;
            };
            let z = live_zscore(&spread(a, b, position.hedge_ratio), self.config.zscore_lookback);
            metrics::set_pair_zscore(&label, z);

            if let Some(mut action) = position.update(z, self.config.entry_z, self.config.exit_z, now) {
                self.sizer.size(&mut action, &bars);
                metrics::record_action(&label, &action.kind.to_string());
                report.actions.push(action);
            }
            self.book.upsert(PositionSnapshot::from_position(position, z));
            report.zscores.push((label, z));
        }

        for action in &report.actions {
            if let Err(e) = self.recorder.record(&SignalRecord::from(action)).await {
                warn!(pair = %action.pair, error = %e, "Failed to record signal");
            }
            if let Err(e) = route_action(self.executor.as_ref(), action).await {
                warn!(pair = %action.pair, error = %e, "Failed to execute action");
            }
        }

        report.active_pairs = self.positions.iter().filter(|p| p.is_active()).count();
        let alloc = self.config.alloc_per_pair_f64();
        report.gross_allocation = report.active_pairs as f64 * alloc * 2.0;
        ACTIVE_PAIRS.set(report.active_pairs as i64);
        self.log_status(&report);

        self.book.updated_at = Some(now);
        if let Some(path) = &self.book_path {
            if let Err(e) = self.book.save(path) {
                warn!(path = %path.display(), error = %e, "Failed to persist position book");
            }
        }
        metrics::record_tick("ok");
        report
    }

    fn log_status(&self, report: &TickReport) {
        let alloc = self.config.alloc_per_pair_f64();
        for (label, z) in &report.zscores {
            let Some(position) = self.positions.iter().find(|p| &p.label() == label) else {
                continue;
            };
            let side = match position.signal {
                SpreadSignal::LongSpread => format!("LONG {}", position.ticker_a),
                SpreadSignal::ShortSpread => format!("LONG {}", position.ticker_b),
                SpreadSignal::Flat => "FLAT".to_string(),
            };
            let allocation = if position.is_active() { alloc * 100.0 } else { 0.0 };
            info!(
                pair = %label,
                z = format!("{:+.2}", z),
                position = %side,
                allocation = format!("{:.0}%", allocation),
                "Pair status"
            );
        }
        info!(
            active = report.active_pairs,
            pairs = self.positions.len(),
            gross = format!("{:.0}%", report.gross_allocation * 100.0),
            actions = report.actions.len(),
            "Portfolio status"
        );
    }

    /// Polls every `interval_secs`; the first tick runs immediately.
    /// Runs forever when `max_ticks` is `None`.
    pub async fn run(&mut self, max_ticks: Option<u64>) {
        info!(
            pairs = self.positions.len(),
            tickers = self.tickers.len(),
            interval_secs = self.config.interval_secs,
            lookback = self.config.zscore_lookback,
            entry_z = self.config.entry_z,
            exit_z = self.config.exit_z,
            "Starting live signal tracker"
        );
        let mut ticker = interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut count = 0u64;
        loop {
            if max_ticks.is_some_and(|max| count >= max) {
                break;
            }
            ticker.tick().await;
            self.tick().await;
            count += 1;
        }
        if let Err(e) = self.recorder.flush().await {
            warn!(error = %e, "Failed to flush signal recorder");
        }
        info!(ticks = count, "Live signal tracker stopped");
    }
}
