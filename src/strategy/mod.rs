//! Spread trading signals
//!
//! A pair's spread is turned into a rolling z-score and fed through a
//! three-state machine (flat, long spread, short spread). The batch generator
//! and the live tracker share the same transition rule.

pub mod config;
pub mod generator;
pub mod signal;

pub use config::SignalConfig;
pub use generator::{generate_signals, SignalTable};
pub use signal::{next_signal, signal_path, SpreadSignal};
