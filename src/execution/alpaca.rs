//! Alpaca trading API executor (market orders, day time-in-force).

use apca::api::v2::asset;
use apca::api::v2::order as alpaca_order;
use apca::api::v2::position as alpaca_position;
use async_trait::async_trait;
use num_decimal::Num;
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::{ExecutionError, Executor};
use crate::data::alpaca::{shared_client, SharedClient};
use crate::types::OrderSide;

pub struct AlpacaExecutor {
    client: SharedClient,
}

impl AlpacaExecutor {
    /// Shares the client with the market data provider.
    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }

    pub fn from_env(paper: bool) -> Result<Self, ExecutionError> {
        let client = shared_client(paper).map_err(|e| ExecutionError::Configuration(e.to_string()))?;
        Ok(Self::new(client))
    }

    /// `BRK-B` style tickers are `BRK.B` on Alpaca.
    fn to_alpaca_symbol(symbol: &str) -> String {
        symbol.replace('-', ".")
    }

    fn decimal_to_num(d: Decimal) -> Result<Num, ExecutionError> {
        d.to_string()
            .parse::<Num>()
            .map_err(|e| ExecutionError::OrderRejected(format!("invalid quantity {}: {}", d, e)))
    }
}

#[async_trait]
impl Executor for AlpacaExecutor {
    async fn execute_order(&self, symbol: &str, side: OrderSide, quantity: Decimal) -> Result<(), ExecutionError> {
        let alpaca_symbol = Self::to_alpaca_symbol(symbol);
        let order_side = match side {
            OrderSide::Buy => alpaca_order::Side::Buy,
            OrderSide::Sell => alpaca_order::Side::Sell,
        };

        info!(symbol = %alpaca_symbol, side = %side, quantity = %quantity, "Submitting Alpaca order");

        let request = alpaca_order::CreateReqInit {
            type_: alpaca_order::Type::Market,
            time_in_force: alpaca_order::TimeInForce::Day,
            ..Default::default()
        }
        .init(
            &alpaca_symbol,
            order_side,
            alpaca_order::Amount::quantity(Self::decimal_to_num(quantity)?),
        );

        let client = self.client.read().await;
        let order = client
            .issue::<alpaca_order::Create>(&request)
            .await
            .map_err(|e| {
                let err_str = e.to_string();
                if err_str.contains("insufficient") || err_str.contains("not shortable") {
                    ExecutionError::OrderRejected(err_str)
                } else {
                    ExecutionError::Broker(format!("Order failed: {}", err_str))
                }
            })?;

        info!(
            order_id = %order.id.as_hyphenated(),
            symbol = %alpaca_symbol,
            status = ?order.status,
            "Alpaca order created"
        );
        Ok(())
    }

    async fn close_position(&self, symbol: &str) -> Result<(), ExecutionError> {
        let alpaca_symbol = Self::to_alpaca_symbol(symbol);
        let sym = asset::Symbol::Sym(alpaca_symbol.clone());

        let client = self.client.read().await;
        match client.issue::<alpaca_position::Delete>(&sym).await {
            Ok(_) => {
                info!(symbol = %alpaca_symbol, "Alpaca position closed");
                Ok(())
            }
            Err(e) => {
                let err_str = e.to_string().to_lowercase();
                if err_str.contains("position does not exist") || err_str.contains("not found") {
                    debug!(symbol = %alpaca_symbol, "No position to close");
                    Ok(())
                } else {
                    Err(ExecutionError::Broker(format!(
                        "Close position failed for {}: {}",
                        alpaca_symbol, e
                    )))
                }
            }
        }
    }
}
