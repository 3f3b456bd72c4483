use rust_decimal::Decimal;
use thiserror::Error;

/// Input-validation failures. All of these mean "skip this trade attempt";
/// none are retryable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SizingError {
    #[error("entry price and stop price are equal; risk distance is zero")]
    ZeroRiskDistance,

    #[error("stop distance {distance_pct}% exceeds the {max_pct}% limit")]
    StopTooWide {
        distance_pct: Decimal,
        max_pct: Decimal,
    },

    #[error("sized quantity rounds to zero lots (raw {raw_quantity}, lot size {lot_size})")]
    QuantityRoundsToZero {
        raw_quantity: Decimal,
        lot_size: u32,
    },

    #[error("invalid sizing parameters: {0}")]
    InvalidParameters(String),
}
