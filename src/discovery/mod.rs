//! Pair discovery
//!
//! Tests every candidate pair of a price matrix for Engle-Granger
//! cointegration and keeps the ones that pass. Two scan modes exist: a fast
//! all-pairs scan ranked by p-value, and a stricter sector-grouped scan that
//! adds spread diagnostics, a composite score and per-sector diversification.
//!
//! # Example
//!
//! ```ignore
//! use statarb::discovery::{find_pairs, ScannerConfig};
//!
//! let config = ScannerConfig::default();
//! let pairs = find_pairs(&prices, &config, None);
//! ```

pub mod candidate;
pub mod config;
pub mod error;
pub mod pair_config;
pub mod scanner;

pub use candidate::{pair_label, PairCandidate};
pub use config::{ScanMode, ScannerConfig};
pub use error::DiscoveryError;
pub use pair_config::{fallback_pairs, load_or_fallback, load_pair_configs, save_pair_configs, PairConfig};
pub use scanner::{diversify, find_cointegrated_pairs, find_pairs, scan_pairs};
