//! CLI argument parsing using clap.
//!
//! This module defines the command-line interface for the pairs trading
//! system, including all subcommands and their arguments.

mod config;

pub use config::{
    parse_tickers, BacktestCliConfig, CliConfigError, DataCliConfig, LiveCliConfig, ScanCliConfig,
};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::data::ProviderId;
use crate::discovery::ScanMode;
use crate::execution::ExecutorId;

/// statarb - Cointegration pairs trading for US equities
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Set the verbosity level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub verbose: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true, default_value_t = false)]
    pub json_logs: bool,

    /// Path to a JSON configuration file (defaults apply when omitted)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Data selection flags shared by `scan` and `backtest`
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// Price source: csv, synthetic, alpaca
    #[arg(long)]
    pub provider: Option<ProviderId>,
    /// Comma-separated ticker universe (overrides the configured one)
    #[arg(long)]
    pub tickers: Option<String>,
    /// First date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// End date, exclusive (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,
    /// Wide price file for the csv provider
    #[arg(long)]
    pub csv_path: Option<PathBuf>,
}

impl From<DataArgs> for DataCliConfig {
    fn from(a: DataArgs) -> Self {
        Self {
            provider: a.provider,
            tickers: a.tickers,
            start: a.start,
            end: a.end,
            csv_path: a.csv_path,
        }
    }
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the walk-forward backtest and write results, metrics and equity curve
    Backtest {
        #[command(flatten)]
        data: DataArgs,
        /// Scanner variant: all-pairs or sector-grouped
        #[arg(long)]
        mode: Option<ScanMode>,
        /// Window advance in sessions (defaults to the trading window)
        #[arg(long)]
        step: Option<usize>,
        /// Output directory for results
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Scan the universe for cointegrated pairs and write the pair table
    Scan {
        #[command(flatten)]
        data: DataArgs,
        /// Scanner variant: all-pairs or sector-grouped
        #[arg(long)]
        mode: Option<ScanMode>,
        /// Maximum number of pairs to keep
        #[arg(long)]
        max_pairs: Option<usize>,
        /// Pair table output path
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Track live z-scores for the configured pairs and route trade actions
    Live {
        /// Bar source: csv, synthetic, alpaca
        #[arg(long)]
        provider: Option<ProviderId>,
        /// Order routing: paper or alpaca
        #[arg(long)]
        executor: Option<ExecutorId>,
        /// Pair table written by `scan`
        #[arg(long)]
        pairs_file: Option<PathBuf>,
        /// Seconds between polls
        #[arg(long)]
        interval_secs: Option<u64>,
        /// Stop after this many polls
        #[arg(long)]
        max_ticks: Option<u64>,
    },
}
