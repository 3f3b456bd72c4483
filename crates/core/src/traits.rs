use crate::events::{ClosedTrade, EntrySignal, Fill, OptionSnapshot, OrderRequest};
use anyhow::Result;
use async_trait::async_trait;

/// Tick/Greeks delivery. Implementations own reconnection and polling
/// fallback; the engine only ever sees a complete snapshot or nothing.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn next_snapshot(&mut self) -> Result<Option<OptionSnapshot>>;
}

/// Upstream market-direction heuristics. Opaque to the decision core.
#[async_trait]
pub trait EntrySignalSource: Send + Sync {
    async fn poll(&mut self, snapshot: &OptionSnapshot) -> Result<Option<EntrySignal>>;
}

/// Order placement. Fills come back as ground truth for price and quantity.
#[async_trait]
pub trait ExecutionHandler: Send + Sync {
    async fn execute(&mut self, order: OrderRequest) -> Result<Fill>;
}

/// Persistence boundary for finished trades.
#[async_trait]
pub trait TradeJournal: Send + Sync {
    async fn record(&mut self, trade: &ClosedTrade) -> Result<()>;
}
