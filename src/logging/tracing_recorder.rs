//! Tracing-based Signal Recorder
//!
//! Emits one structured event per trade action under the `signals` target.

use super::recorder::{RecordError, SignalRecord, SignalRecorder};
use async_trait::async_trait;
use tracing::info;

#[derive(Debug, Default)]
pub struct TracingRecorder;

impl TracingRecorder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SignalRecorder for TracingRecorder {
    async fn record(&self, record: &SignalRecord) -> Result<(), RecordError> {
        info!(
            target: "signals",
            record_id = %record.record_id,
            timestamp = %record.timestamp.to_rfc3339(),
            pair = %record.pair,
            action = %record.action,
            long = %record.long,
            short = %record.short,
            z_score = record.z_score,
            hedge_ratio = record.hedge_ratio,
            sector = %record.sector,
            shares_long = record.shares_long,
            shares_short = record.shares_short,
            "Signal recorded"
        );
        Ok(())
    }
}
