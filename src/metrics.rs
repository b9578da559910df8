//! Prometheus Metrics Module
//!
//! Pre-registered metrics for the live signal loop.

use lazy_static::lazy_static;
use prometheus::{
    opts, register_gauge_vec, register_histogram_vec, register_int_counter_vec, register_int_gauge,
    Encoder, GaugeVec, HistogramVec, IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // --- Loop Metrics ---

    /// Live loop ticks (by outcome: ok, fetch_failed, empty)
    pub static ref LIVE_TICKS_TOTAL: IntCounterVec = register_int_counter_vec!(
        opts!("statarb_live_ticks_total", "Live loop ticks"),
        &["status"]
    ).expect("FATAL: Failed to register LIVE_TICKS_TOTAL metric - check for duplicate registration");

    /// Recent-bar fetch latency in seconds
    pub static ref FETCH_LATENCY: HistogramVec = register_histogram_vec!(
        "statarb_fetch_latency_seconds",
        "Recent bar fetch latency",
        &["provider"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).expect("FATAL: Failed to register FETCH_LATENCY metric - check for duplicate registration");

    // --- Signal Metrics ---

    /// Latest z-score per pair
    pub static ref PAIR_ZSCORE: GaugeVec = register_gauge_vec!(
        opts!("statarb_pair_zscore", "Latest spread z-score"),
        &["pair"]
    ).expect("FATAL: Failed to register PAIR_ZSCORE metric - check for duplicate registration");

    /// Trade actions emitted (by pair and action kind)
    pub static ref TRADE_ACTIONS: IntCounterVec = register_int_counter_vec!(
        opts!("statarb_trade_actions_total", "Trade actions emitted"),
        &["pair", "action"]
    ).expect("FATAL: Failed to register TRADE_ACTIONS metric - check for duplicate registration");

    /// Pairs currently holding a spread position
    pub static ref ACTIVE_PAIRS: IntGauge = register_int_gauge!(
        opts!("statarb_active_pairs", "Pairs holding a spread position")
    ).expect("FATAL: Failed to register ACTIVE_PAIRS metric - check for duplicate registration");

    // --- Order Metrics ---

    /// Orders sent (by symbol, side, status)
    pub static ref ORDERS_TOTAL: IntCounterVec = register_int_counter_vec!(
        opts!("statarb_orders_total", "Orders sent to the executor"),
        &["symbol", "side", "status"]
    ).expect("FATAL: Failed to register ORDERS_TOTAL metric - check for duplicate registration");
}

/// Record an order execution
pub fn record_order(symbol: &str, side: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    ORDERS_TOTAL.with_label_values(&[symbol, side, status]).inc();
}

/// Record one live tick outcome
pub fn record_tick(status: &str) {
    LIVE_TICKS_TOTAL.with_label_values(&[status]).inc();
}

pub fn record_fetch_latency(provider: &str, latency_secs: f64) {
    FETCH_LATENCY.with_label_values(&[provider]).observe(latency_secs);
}

pub fn set_pair_zscore(pair: &str, z: f64) {
    PAIR_ZSCORE.with_label_values(&[pair]).set(z);
}

pub fn record_action(pair: &str, action: &str) {
    TRADE_ACTIONS.with_label_values(&[pair, action]).inc();
}

/// Get metrics in the Prometheus text exposition format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode Prometheus metrics: {}", e);
        return String::new();
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Prometheus metrics buffer is not valid UTF-8: {}", e);
            String::new()
        }
    }
}
