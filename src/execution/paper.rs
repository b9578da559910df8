//! Simulated execution: orders are logged and netted in memory.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::info;

use super::{ExecutionError, Executor};
use crate::types::OrderSide;

#[derive(Debug, Default)]
pub struct PaperExecutor {
    positions: Mutex<HashMap<String, Decimal>>,
}

impl PaperExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Net simulated share position in `symbol` (negative when short).
    pub fn position(&self, symbol: &str) -> Decimal {
        let guard = self.positions.lock().unwrap_or_else(|e| e.into_inner());
        guard.get(symbol).copied().unwrap_or(Decimal::ZERO)
    }
}

#[async_trait]
impl Executor for PaperExecutor {
    async fn execute_order(&self, symbol: &str, side: OrderSide, quantity: Decimal) -> Result<(), ExecutionError> {
        let signed = match side {
            OrderSide::Buy => quantity,
            OrderSide::Sell => -quantity,
        };
        let net = {
            let mut guard = self.positions.lock().unwrap_or_else(|e| e.into_inner());
            let entry = guard.entry(symbol.to_string()).or_insert(Decimal::ZERO);
            *entry += signed;
            *entry
        };
        info!(symbol, side = %side, quantity = %quantity, net = %net, "PAPER ORDER");
        Ok(())
    }

    async fn close_position(&self, symbol: &str) -> Result<(), ExecutionError> {
        let previous = {
            let mut guard = self.positions.lock().unwrap_or_else(|e| e.into_inner());
            guard.remove(symbol)
        };
        info!(symbol, closed = %previous.unwrap_or(Decimal::ZERO), "PAPER CLOSE");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_nets_and_closes() {
        let exec = PaperExecutor::new();
        exec.execute_order("KO", OrderSide::Buy, dec!(100)).await.unwrap();
        exec.execute_order("KO", OrderSide::Sell, dec!(30)).await.unwrap();
        exec.execute_order("PEP", OrderSide::Sell, dec!(50)).await.unwrap();
        assert_eq!(exec.position("KO"), dec!(70));
        assert_eq!(exec.position("PEP"), dec!(-50));

        exec.close_position("KO").await.unwrap();
        assert_eq!(exec.position("KO"), Decimal::ZERO);
        // closing a symbol with no position is fine
        exec.close_position("XOM").await.unwrap();
    }
}
