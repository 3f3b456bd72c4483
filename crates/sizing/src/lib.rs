//! Risk-first position sizing.
//!
//! Quantity is derived from the risk budget and stop distance, never from
//! conviction: `risk_budget / |entry - stop|`, scaled down by the expiry
//! policy and floored to whole lots. A quantity that rounds to zero is a
//! skip signal, not a zero-unit order.

pub mod calculator;
pub mod error;

pub use calculator::{PositionSize, PositionSizer, SizeRequest, SizedTrade};
pub use error::SizingError;
