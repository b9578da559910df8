//! Signal Recording System
//!
//! Provides a pluggable `SignalRecorder` trait for recording live trade
//! actions to various backends:
//! - CSV (`signals.csv`)
//! - structured logs via tracing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::live::TradeAction;

/// Error type for signal recording operations
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Flat, one-row view of a trade action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    /// Unique record identifier
    pub record_id: String,
    pub timestamp: DateTime<Utc>,
    pub pair: String,
    pub action: String,
    /// Leg bought on entry (empty on exit)
    pub long: String,
    /// Leg sold short on entry (empty on exit)
    pub short: String,
    pub z_score: f64,
    pub entry_z: Option<f64>,
    pub exit_z: Option<f64>,
    /// State being closed, for exits
    pub prev_signal: String,
    pub hedge_ratio: f64,
    pub sector: String,
    pub shares_long: u64,
    pub shares_short: u64,
}

impl From<&TradeAction> for SignalRecord {
    fn from(action: &TradeAction) -> Self {
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            timestamp: action.timestamp,
            pair: action.pair.clone(),
            action: action.kind.to_string(),
            long: action.long_ticker.clone().unwrap_or_default(),
            short: action.short_ticker.clone().unwrap_or_default(),
            z_score: action.z_score,
            entry_z: action.entry_z,
            exit_z: action.exit_z,
            prev_signal: action.prev_signal.map(|s| s.to_string()).unwrap_or_default(),
            hedge_ratio: action.hedge_ratio,
            sector: action.sector.clone(),
            shares_long: action.shares_long,
            shares_short: action.shares_short,
        }
    }
}

/// Trait for recording trade actions to various backends
#[async_trait]
pub trait SignalRecorder: Send + Sync {
    /// Record an action. Implementations should be non-blocking.
    async fn record(&self, record: &SignalRecord) -> Result<(), RecordError>;

    /// Flush any buffered records (optional, default no-op)
    async fn flush(&self) -> Result<(), RecordError> {
        Ok(())
    }
}

/// A recorder that fans out to multiple backends
pub struct MultiRecorder {
    recorders: Vec<Box<dyn SignalRecorder>>,
}

impl MultiRecorder {
    /// Create a new multi-recorder with the given backends
    pub fn new(recorders: Vec<Box<dyn SignalRecorder>>) -> Self {
        Self { recorders }
    }
}

#[async_trait]
impl SignalRecorder for MultiRecorder {
    async fn record(&self, record: &SignalRecord) -> Result<(), RecordError> {
        let mut error_count = 0;
        let mut last_error = None;

        for recorder in &self.recorders {
            if let Err(e) = recorder.record(record).await {
                tracing::error!(error = %e, "Failed to record signal to backend");
                last_error = Some(e);
                error_count += 1;
            }
        }

        // Only an error when every backend failed
        if error_count > 0 && error_count == self.recorders.len() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        Ok(())
    }

    async fn flush(&self) -> Result<(), RecordError> {
        for recorder in &self.recorders {
            recorder.flush().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::PairConfig;
    use crate::live::PairPosition;

    struct FailingRecorder;

    #[async_trait]
    impl SignalRecorder for FailingRecorder {
        async fn record(&self, _record: &SignalRecord) -> Result<(), RecordError> {
            Err(RecordError::Serialization("down".into()))
        }
    }

    struct OkRecorder;

    #[async_trait]
    impl SignalRecorder for OkRecorder {
        async fn record(&self, _record: &SignalRecord) -> Result<(), RecordError> {
            Ok(())
        }
    }

    fn exit_record() -> SignalRecord {
        let mut p = PairPosition::new(&PairConfig::new("HD", "LOW", 1.3, "Consumer Discretionary"));
        p.update(2.1, 2.0, 0.5, Utc::now());
        let exit = p.update(0.1, 2.0, 0.5, Utc::now()).unwrap();
        SignalRecord::from(&exit)
    }

    #[test]
    fn test_record_from_exit() {
        let r = exit_record();
        assert_eq!(r.action, "EXIT");
        assert_eq!(r.prev_signal, "SHORT_SPREAD");
        assert_eq!(r.entry_z, Some(2.1));
        assert_eq!(r.exit_z, Some(0.1));
        assert!(r.long.is_empty());
    }

    #[tokio::test]
    async fn test_multi_recorder_fails_only_when_all_fail() {
        let record = exit_record();
        let mixed = MultiRecorder::new(vec![Box::new(FailingRecorder), Box::new(OkRecorder)]);
        assert!(mixed.record(&record).await.is_ok());

        let all_bad = MultiRecorder::new(vec![Box::new(FailingRecorder)]);
        assert!(all_bad.record(&record).await.is_err());
    }
}
