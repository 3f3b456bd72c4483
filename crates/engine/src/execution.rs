use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use scalp_core::config::ExecutionConfig;
use scalp_core::events::{Fill, OrderRequest, OrderSide};
use scalp_core::traits::ExecutionHandler;

/// Paper-trading execution: fills at the reference price with configurable
/// slippage (bps) and a flat per-lot commission.
pub struct SimulatedExecutionHandler {
    slippage_bps: Decimal,
    commission_per_lot: Decimal,
    lot_size: u32,
}

impl SimulatedExecutionHandler {
    #[must_use]
    pub fn new(config: &ExecutionConfig, lot_size: u32) -> Self {
        Self {
            slippage_bps: config.slippage_bps,
            commission_per_lot: config.commission_per_lot,
            lot_size: lot_size.max(1),
        }
    }

    fn apply_slippage(&self, price: Decimal, side: OrderSide) -> Decimal {
        let slippage = price * self.slippage_bps / Decimal::from(10_000);
        match side {
            OrderSide::Buy => price + slippage,
            OrderSide::Sell => price - slippage,
        }
    }
}

#[async_trait]
impl ExecutionHandler for SimulatedExecutionHandler {
    async fn execute(&mut self, order: OrderRequest) -> Result<Fill> {
        let reference = order
            .limit_price
            .ok_or_else(|| anyhow::anyhow!("simulated fills need a reference price"))?;
        let fill_price = self.apply_slippage(reference, order.side);
        let num_lots = Decimal::from(order.quantity.div_ceil(self.lot_size));
        let commission = num_lots * self.commission_per_lot;

        let fill = Fill {
            order_id: uuid::Uuid::new_v4().to_string(),
            symbol: order.symbol,
            side: order.side,
            quantity: order.quantity,
            price: fill_price,
            commission,
            timestamp: order.timestamp,
        };
        tracing::debug!(
            order_id = %fill.order_id,
            price = %fill.price,
            quantity = fill.quantity,
            "simulated fill"
        );
        Ok(fill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn order(side: OrderSide, quantity: u32) -> OrderRequest {
        OrderRequest {
            symbol: "NIFTY24600CE".to_string(),
            side,
            quantity,
            limit_price: Some(dec!(100)),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn buys_slip_up_and_sells_slip_down() {
        let config = ExecutionConfig {
            slippage_bps: dec!(10),
            commission_per_lot: dec!(20),
        };
        let mut handler = SimulatedExecutionHandler::new(&config, 75);

        let buy = handler.execute(order(OrderSide::Buy, 150)).await.unwrap();
        assert_eq!(buy.price, dec!(100.10));
        assert_eq!(buy.commission, dec!(40)); // two lots

        let sell = handler.execute(order(OrderSide::Sell, 150)).await.unwrap();
        assert_eq!(sell.price, dec!(99.90));
    }
}
