//! Order execution for live trade actions
//!
//! `route_action` maps an entry to a buy of the long leg and a short sale of
//! the short leg, and an exit to closing both legs. Backends implement
//! [`Executor`].

pub mod alpaca;
pub mod paper;

pub use alpaca::AlpacaExecutor;
pub use paper::PaperExecutor;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::live::{ActionKind, TradeAction};
use crate::metrics::record_order;
use crate::types::OrderSide;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("Broker error: {0}")]
    Broker(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

#[async_trait]
pub trait Executor: Send + Sync {
    /// Submits a market order for a whole number of shares.
    async fn execute_order(&self, symbol: &str, side: OrderSide, quantity: Decimal) -> Result<(), ExecutionError>;

    /// Flattens any open position in `symbol`. A missing position is not an error.
    async fn close_position(&self, symbol: &str) -> Result<(), ExecutionError>;
}

/// Execution backend selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorId {
    /// Log orders without sending them
    Paper,
    /// Alpaca trading API (paper or live endpoint per provider settings)
    Alpaca,
}

impl std::fmt::Display for ExecutorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutorId::Paper => write!(f, "paper"),
            ExecutorId::Alpaca => write!(f, "alpaca"),
        }
    }
}

impl std::str::FromStr for ExecutorId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "paper" => Ok(ExecutorId::Paper),
            "alpaca" => Ok(ExecutorId::Alpaca),
            _ => Err(format!("Unknown executor: {}. Valid options: paper, alpaca", s)),
        }
    }
}

pub fn create_executor(id: ExecutorId, paper: bool) -> Result<Arc<dyn Executor>, ExecutionError> {
    match id {
        ExecutorId::Paper => Ok(Arc::new(PaperExecutor::new())),
        ExecutorId::Alpaca => Ok(Arc::new(AlpacaExecutor::from_env(paper)?)),
    }
}

async fn submit(executor: &dyn Executor, symbol: &str, side: OrderSide, shares: u64) -> Result<(), ExecutionError> {
    if shares == 0 {
        return Ok(());
    }
    let result = executor.execute_order(symbol, side, Decimal::from(shares)).await;
    record_order(symbol, &side.to_string(), result.is_ok());
    if let Err(e) = &result {
        error!(symbol, side = %side, shares, error = %e, "Order failed");
    }
    result
}

/// Sends the orders for one trade action.
///
/// Every leg is attempted even if an earlier one fails; the first error is
/// returned afterwards.
pub async fn route_action(executor: &dyn Executor, action: &TradeAction) -> Result<(), ExecutionError> {
    match action.kind {
        ActionKind::EnterLongSpread | ActionKind::EnterShortSpread => {
            let (Some(long), Some(short)) = (&action.long_ticker, &action.short_ticker) else {
                return Err(ExecutionError::OrderRejected(format!(
                    "entry for {} has no legs",
                    action.pair
                )));
            };
            let buy = submit(executor, long, OrderSide::Buy, action.shares_long).await;
            let sell = submit(executor, short, OrderSide::Sell, action.shares_short).await;
            info!(
                pair = %action.pair,
                action = %action.kind,
                long = %long,
                shares_long = action.shares_long,
                short = %short,
                shares_short = action.shares_short,
                "Entry routed"
            );
            buy.and(sell)
        }
        ActionKind::Exit => {
            let first = executor.close_position(&action.ticker_a).await;
            let second = executor.close_position(&action.ticker_b).await;
            for (symbol, result) in [(&action.ticker_a, &first), (&action.ticker_b, &second)] {
                if let Err(e) = result {
                    error!(symbol = %symbol, error = %e, "Close position failed");
                }
            }
            info!(pair = %action.pair, "Exit routed");
            first.and(second)
        }
    }
}
