//! Live tracking command handler.
//!
//! Implements the `live` subcommand: polls recent bars for the configured
//! pairs, steps their state machines and routes the resulting trade actions.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cli::LiveCliConfig;
use crate::config::StatArbConfig;
use crate::data::alpaca::shared_client;
use crate::data::{create_provider, AlpacaProvider, PriceProvider, ProviderId};
use crate::discovery::load_or_fallback;
use crate::execution::{create_executor, AlpacaExecutor, Executor, ExecutorId};
use crate::live::LiveTracker;
use crate::logging::{CsvRecorder, MultiRecorder, SignalRecorder, TracingRecorder};
use crate::metrics::gather_metrics;
use crate::types::SystemClock;

fn needs_alpaca_client(provider: ProviderId, executor: ExecutorId) -> bool {
    provider == ProviderId::Alpaca || executor == ExecutorId::Alpaca
}

/// Market data and order routing backends. When both sides talk to Alpaca
/// they share one client.
fn build_backends(
    config: &StatArbConfig,
) -> Result<(Arc<dyn PriceProvider>, Arc<dyn Executor>), Box<dyn std::error::Error>> {
    let (provider_id, executor_id) = (config.provider.id, config.live.executor);
    let client = if needs_alpaca_client(provider_id, executor_id) {
        Some(shared_client(config.provider.paper)?)
    } else {
        None
    };

    let provider: Arc<dyn PriceProvider> = match (&client, provider_id) {
        (Some(client), ProviderId::Alpaca) => {
            Arc::new(AlpacaProvider::new(client.clone(), config.provider.recent_days))
        }
        _ => create_provider(provider_id, &config.provider.settings())?,
    };
    let executor: Arc<dyn Executor> = match (client, executor_id) {
        (Some(client), ExecutorId::Alpaca) => Arc::new(AlpacaExecutor::new(client)),
        _ => create_executor(executor_id, config.provider.paper)?,
    };
    Ok((provider, executor))
}

/// Run the live tracker until `max_ticks` polls complete or Ctrl-C.
///
/// # Errors
/// Returns error if the config is invalid or a backend cannot be constructed.
pub async fn run_live(
    mut config: StatArbConfig,
    cli: LiveCliConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    cli.apply(&mut config);
    config.validate()?;

    info!("--- StatArb: Live Signal Tracker ---");
    let pairs = load_or_fallback(&config.live.pairs_file);
    let (provider, executor) = build_backends(&config)?;
    if config.live.executor == ExecutorId::Alpaca && !config.provider.paper {
        warn!("Routing orders to a LIVE brokerage account");
    }

    let recorder: Arc<dyn SignalRecorder> = Arc::new(MultiRecorder::new(vec![
        Box::new(CsvRecorder::new(config.live.signals_file.clone())),
        Box::new(TracingRecorder::new()),
    ]));

    let mut tracker = LiveTracker::new(
        &pairs,
        config.live.clone(),
        provider,
        executor,
        recorder,
        Arc::new(SystemClock),
    )
    .with_position_book(config.live.positions_file.clone());

    info!(
        pairs = tracker.positions().len(),
        executor = %config.live.executor,
        provider = %config.provider.id,
        signals = %config.live.signals_file.display(),
        "Live tracker configured"
    );

    tokio::select! {
        _ = tracker.run(cli.max_ticks) => {}
        result = tokio::signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Received Ctrl-C, shutting down"),
                Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
            }
        }
    }
    debug!(metrics = %gather_metrics(), "Final metrics snapshot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpaca_client_only_when_a_backend_needs_it() {
        assert!(!needs_alpaca_client(ProviderId::Synthetic, ExecutorId::Paper));
        assert!(!needs_alpaca_client(ProviderId::Csv, ExecutorId::Paper));
        assert!(needs_alpaca_client(ProviderId::Alpaca, ExecutorId::Paper));
        assert!(needs_alpaca_client(ProviderId::Csv, ExecutorId::Alpaca));
        assert!(needs_alpaca_client(ProviderId::Alpaca, ExecutorId::Alpaca));
    }

    #[test]
    fn test_offline_backends_build_without_credentials() {
        let mut config = StatArbConfig::default();
        config.provider.id = ProviderId::Synthetic;
        config.live.executor = ExecutorId::Paper;
        let (provider, _executor) = build_backends(&config).unwrap();
        assert_eq!(provider.provider_id(), ProviderId::Synthetic);
    }
}
