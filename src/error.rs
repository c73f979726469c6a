//! Error taxonomy for the POS core.
//!
//! `InvalidInput` marks caller bugs (negative prices, out-of-range discounts)
//! and fails loudly rather than clamping. `Unavailable` covers collaborators
//! that have not come up yet and is retryable. `Persistence` and `Print` wrap
//! collaborator failures; a print failure never unwinds an already-persisted
//! order.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PosError {
    /// Programmer error at the pricing boundary. Should not occur from a
    /// correctly gated UI.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A collaborator (printer, database) is not ready yet. Recoverable by
    /// bounded retry.
    #[error("{0} not available")]
    Unavailable(&'static str),

    /// The database reported a failure. The order is not considered placed.
    #[error("database error: {0}")]
    Persistence(String),

    /// The printer call failed or timed out. Best-effort side effect; the
    /// persisted order stands.
    #[error("print failed: {0}")]
    Print(String),
}

impl From<rusqlite::Error> for PosError {
    fn from(err: rusqlite::Error) -> Self {
        PosError::Persistence(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for PosError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        PosError::Persistence(format!("connection lock poisoned: {err}"))
    }
}
