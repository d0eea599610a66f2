use agegate_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("shop not found: {0}")]
    ShopNotFound(String),

    #[error("shop {0} is not active")]
    ShopInactive(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The session's TTL elapsed. Expiry is a hard cutoff; nothing extends
    /// it, and this is reported distinctly from a failed verification.
    #[error("session {0} has expired")]
    SessionExpired(String),

    #[error("verification record not found: {0}")]
    RecordNotFound(String),

    /// The record already carries its outcome. Callers treat this as a
    /// no-op, not a user-facing failure.
    #[error("verification record {0} already has an outcome")]
    AlreadyTerminal(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("evidence not usable: {0}")]
    EvidenceInvalid(String),

    /// An external capability (identity provider, detector) is unreachable.
    /// The attempt is not failed; the caller may retry.
    #[error("upstream unavailable: {0}")]
    Upstream(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl VerificationError {
    /// Map a store lookup miss onto the entity-specific not-found variant.
    pub(crate) fn record_lookup(err: StoreError, id: &agegate_types::RecordId) -> Self {
        match err {
            StoreError::NotFound(_) => Self::RecordNotFound(id.to_string()),
            other => Self::Store(other),
        }
    }
}
