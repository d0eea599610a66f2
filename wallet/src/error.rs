use agegate_store::StoreError;
use thiserror::Error;

use crate::gateway::GatewayError;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("company not found: {0}")]
    CompanyNotFound(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("transaction not found: {0}")]
    TransactionNotFound(String),

    /// The statement feed kept rate-limiting until the retry budget ran
    /// out. Distinct from other upstream errors so callers can tell
    /// "exhausted retries" from "feed is broken".
    #[error("statement feed still rate limited after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
