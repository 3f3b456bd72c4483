pub mod config;
pub mod config_loader;
pub mod events;
pub mod traits;

pub use config::{
    AppConfig, ExecutionConfig, ExitConfig, GovernorConfig, SessionConfig, SizingConfig,
};
pub use config_loader::ConfigLoader;
pub use events::{
    ClosedTrade, EntrySignal, ExitReason, Fill, Greeks, OptionSnapshot, OrderRequest, OrderSide,
    PositionSide,
};
pub use traits::{EntrySignalSource, ExecutionHandler, MarketDataSource, TradeJournal};
