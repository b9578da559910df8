pub mod backtest;
pub mod cli;
pub mod commands;
pub mod config;
pub mod data;
pub mod discovery;
pub mod execution;
pub mod live;
pub mod logging;
pub mod math;
pub mod metrics;
pub mod observability;
pub mod portfolio;
pub mod state;
pub mod strategy;
pub mod types;
