use anyhow::Result;
use async_trait::async_trait;
use scalp_core::events::ClosedTrade;
use scalp_core::traits::TradeJournal;

/// Journal that renders closed trades to the structured log. Persistent
/// storage lives behind the same trait in an external collaborator.
#[derive(Debug, Default)]
pub struct LogJournal;

#[async_trait]
impl TradeJournal for LogJournal {
    async fn record(&mut self, trade: &ClosedTrade) -> Result<()> {
        tracing::info!(
            id = %trade.id,
            symbol = %trade.symbol,
            reason = %trade.exit_reason,
            entry_price = %trade.entry_price,
            exit_price = %trade.exit_price,
            quantity = trade.quantity,
            duration_secs = trade.duration_secs,
            realized_pnl = %trade.realized_pnl,
            net_pnl = %trade.net_pnl,
            record = %serde_json::to_string(trade)?,
            "trade journaled"
        );
        Ok(())
    }
}
