//! Per-pair live position and the trade actions it emits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use crate::discovery::{pair_label, PairConfig};
use crate::strategy::{next_signal, SpreadSignal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    EnterLongSpread,
    EnterShortSpread,
    Exit,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::EnterLongSpread => write!(f, "ENTER_LONG_SPREAD"),
            ActionKind::EnterShortSpread => write!(f, "ENTER_SHORT_SPREAD"),
            ActionKind::Exit => write!(f, "EXIT"),
        }
    }
}

/// A discrete state transition of one pair.
///
/// Entries name the long and short legs; exits carry the state being closed
/// and the z-scores at entry and exit. Share counts are filled by the sizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeAction {
    pub kind: ActionKind,
    pub pair: String,
    pub ticker_a: String,
    pub ticker_b: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_ticker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_ticker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_signal: Option<SpreadSignal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_z: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_z: Option<f64>,
    pub hedge_ratio: f64,
    pub z_score: f64,
    pub timestamp: DateTime<Utc>,
    pub sector: String,
    #[serde(default)]
    pub shares_long: u64,
    #[serde(default)]
    pub shares_short: u64,
}

impl TradeAction {
    pub fn is_entry(&self) -> bool {
        self.kind != ActionKind::Exit
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairPosition {
    pub ticker_a: String,
    pub ticker_b: String,
    pub hedge_ratio: f64,
    pub sector: String,
    pub signal: SpreadSignal,
    pub entry_z: Option<f64>,
    pub entry_time: Option<DateTime<Utc>>,
}

impl PairPosition {
    pub fn new(config: &PairConfig) -> Self {
        Self {
            ticker_a: config.ticker_a.clone(),
            ticker_b: config.ticker_b.clone(),
            hedge_ratio: config.hedge_ratio,
            sector: config.sector.clone(),
            signal: SpreadSignal::Flat,
            entry_z: None,
            entry_time: None,
        }
    }

    pub fn label(&self) -> String {
        pair_label(&self.ticker_a, &self.ticker_b)
    }

    pub fn is_active(&self) -> bool {
        !self.signal.is_flat()
    }

    /// Feeds one z-score observation through the state machine.
    ///
    /// Returns the action when the state changed.
    pub fn update(&mut self, z: f64, entry_z: f64, exit_z: f64, timestamp: DateTime<Utc>) -> Option<TradeAction> {
        let prev = self.signal;
        let next = next_signal(prev, z, entry_z, exit_z);
        if next == prev {
            return None;
        }

        let mut action = TradeAction {
            kind: ActionKind::Exit,
            pair: self.label(),
            ticker_a: self.ticker_a.clone(),
            ticker_b: self.ticker_b.clone(),
            long_ticker: None,
            short_ticker: None,
            prev_signal: None,
            entry_z: None,
            exit_z: None,
            hedge_ratio: self.hedge_ratio,
            z_score: z,
            timestamp,
            sector: self.sector.clone(),
            shares_long: 0,
            shares_short: 0,
        };

        match next {
            SpreadSignal::LongSpread => {
                action.kind = ActionKind::EnterLongSpread;
                action.long_ticker = Some(self.ticker_a.clone());
                action.short_ticker = Some(self.ticker_b.clone());
                self.entry_z = Some(z);
                self.entry_time = Some(timestamp);
            }
            SpreadSignal::ShortSpread => {
                action.kind = ActionKind::EnterShortSpread;
                action.long_ticker = Some(self.ticker_b.clone());
                action.short_ticker = Some(self.ticker_a.clone());
                self.entry_z = Some(z);
                self.entry_time = Some(timestamp);
            }
            SpreadSignal::Flat => {
                action.prev_signal = Some(prev);
                action.entry_z = self.entry_z.take();
                action.exit_z = Some(z);
                self.entry_time = None;
            }
        }
        self.signal = next;

        info!(
            pair = %action.pair,
            action = %action.kind,
            z = format!("{:.2}", z),
            sector = %self.sector,
            "Pair state changed"
        );
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 14, minute, 0).unwrap()
    }

    fn position() -> PairPosition {
        PairPosition::new(&PairConfig::new("KO", "PEP", 0.8, "Consumer Staples"))
    }

    #[test]
    fn test_long_entry_then_exit() {
        let mut p = position();
        assert!(p.update(-1.0, 2.0, 0.5, ts(0)).is_none());

        let enter = p.update(-2.2, 2.0, 0.5, ts(5)).unwrap();
        assert_eq!(enter.kind, ActionKind::EnterLongSpread);
        assert_eq!(enter.long_ticker.as_deref(), Some("KO"));
        assert_eq!(enter.short_ticker.as_deref(), Some("PEP"));
        assert_eq!(p.entry_time, Some(ts(5)));
        assert!(p.is_active());

        assert!(p.update(-1.0, 2.0, 0.5, ts(10)).is_none());

        let exit = p.update(0.2, 2.0, 0.5, ts(15)).unwrap();
        assert_eq!(exit.kind, ActionKind::Exit);
        assert_eq!(exit.prev_signal, Some(SpreadSignal::LongSpread));
        assert_eq!(exit.entry_z, Some(-2.2));
        assert_eq!(exit.exit_z, Some(0.2));
        assert!(!p.is_active());
        assert!(p.entry_z.is_none() && p.entry_time.is_none());
    }

    #[test]
    fn test_short_entry_longs_leg_b() {
        let mut p = position();
        let action = p.update(2.5, 2.0, 0.5, ts(0)).unwrap();
        assert_eq!(action.kind, ActionKind::EnterShortSpread);
        assert_eq!(action.long_ticker.as_deref(), Some("PEP"));
        assert_eq!(action.short_ticker.as_deref(), Some("KO"));
        assert_eq!(action.pair, "KO/PEP");
        assert_eq!(action.sector, "Consumer Staples");
        assert_eq!(action.hedge_ratio, 0.8);
    }
}
