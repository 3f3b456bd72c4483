//! Daily capital preservation.
//!
//! One governor instance per trading session gates every entry attempt:
//! cumulative loss floor and trade-count ceiling arm a sticky kill switch,
//! while a consecutive-loss streak opens a soft cooldown that expires or can
//! be cleared manually. Survival first, then profit.

pub mod error;
pub mod governor;

pub use error::GovernorError;
pub use governor::{
    BlockReason, DailyRiskGovernor, EntryDecision, HaltReason, RiskMetrics,
};
