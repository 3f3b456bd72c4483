use thiserror::Error;

/// State-conflict errors. These indicate a sequencing bug in the caller:
/// fatal to the specific action, never to the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TradeError {
    #[error("maximum of {max} concurrent position(s) already open")]
    ConcurrentPositionLimit { max: usize },

    #[error("a position in {symbol} is already open; averaging in is forbidden")]
    PositionAlreadyOpen { symbol: String },

    #[error("trade {id} is already closed")]
    AlreadyClosed { id: String },

    #[error("unknown trade id {id}")]
    UnknownTrade { id: String },
}
