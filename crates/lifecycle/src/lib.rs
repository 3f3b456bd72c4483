//! Trade lifecycle: entry, per-tick monitoring, prioritized exit evaluation,
//! and terminal close with P&L accounting.
//!
//! The manager is synchronous and clock-free: elapsed time comes from
//! snapshot timestamps, so behavior replays deterministically. Callers must
//! feed ticks per trade in non-decreasing timestamp order and act on an exit
//! decision before the trade's next tick.

pub mod error;
pub mod manager;
pub mod trade;
pub mod triggers;

pub use error::TradeError;
pub use manager::{SessionStats, TradeManager};
pub use trade::{GammaPeakDetector, Trade, TradeStatus};
