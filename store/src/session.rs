//! Verification session storage trait.

use crate::StoreError;
use agegate_types::{RecordId, SessionId, SessionStatus, ShopId, Timestamp};
use serde::{Deserialize, Serialize};

/// One end-user's bounded-lifetime attempt to complete age verification
/// for a given shop.
///
/// Sessions are never physically deleted; an expired session is retained
/// for audit but logically dead.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationSession {
    pub id: SessionId,
    pub shop: ShopId,
    pub status: SessionStatus,
    pub created_at: Timestamp,
    /// Hard cutoff. No operation may extend it.
    pub expires_at: Timestamp,
    /// The verification record this session is linked to, once a method
    /// adapter has started one.
    pub record: Option<RecordId>,
    /// Token embedded in the cross-device pairing URL.
    pub pairing_token: String,
}

impl VerificationSession {
    /// Whether the TTL has elapsed at `now`. This is the read-time check;
    /// durable expiry is the store's `expire_session`.
    pub fn ttl_elapsed(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }
}

/// Trait for storing verification sessions.
///
/// `advance_session` enforces the forward-only ordering
/// `Pending < Paired < Completed` (with `Expired` reachable from any
/// non-terminal status); advancing to the current status is an idempotent
/// no-op so externally re-delivered events are harmless.
pub trait SessionStore: Send + Sync {
    /// Persist a fresh session. Errors with `Duplicate` if the id exists.
    fn create_session(&self, session: &VerificationSession) -> Result<(), StoreError>;

    fn get_session(&self, id: &SessionId) -> Result<VerificationSession, StoreError>;

    /// Move the session forward to `to`. Backward targets error with
    /// `IllegalTransition`; terminal sessions refuse every move away.
    fn advance_session(
        &self,
        id: &SessionId,
        to: SessionStatus,
    ) -> Result<VerificationSession, StoreError>;

    /// Link a verification record to the session. The link is set once;
    /// re-attaching the same record is a no-op.
    fn attach_record(
        &self,
        id: &SessionId,
        record: &RecordId,
    ) -> Result<VerificationSession, StoreError>;

    /// Durably mark the session expired. Idempotent; a completed session
    /// is left untouched (it was terminal before the TTL elapsed).
    fn expire_session(&self, id: &SessionId) -> Result<VerificationSession, StoreError>;

    /// Reverse lookup used when a method adapter resolves a record and
    /// needs to advance the owning session.
    fn find_by_record(&self, record: &RecordId)
        -> Result<Option<VerificationSession>, StoreError>;
}
