use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("duplicate key: {0}")]
    Duplicate(String),

    /// The record already carries a terminal outcome. Reported distinctly
    /// so losers of a completion race can treat it as a no-op.
    #[error("record {0} is already terminal")]
    AlreadyTerminal(String),

    /// The transaction was already settled. Reported distinctly so a
    /// re-delivered statement line never double-credits.
    #[error("transaction {0} is already settled")]
    AlreadySettled(String),

    #[error("illegal {entity} transition: {from} -> {to}")]
    IllegalTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("storage backend error: {0}")]
    Backend(String),
}
