use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GovernorError {
    /// Precondition violation in the limits themselves; not expected in
    /// normal operation.
    #[error("invalid governor configuration: {0}")]
    InvalidConfig(String),
}
