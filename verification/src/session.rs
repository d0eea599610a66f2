//! Verification session manager.
//!
//! Owns the session entity, its TTL, and cross-device pairing. Expiry is
//! computed lazily against the injected clock and persisted the first time
//! it is observed, so a session never flickers between expired and live
//! under clock skew. No operation extends a session's TTL.

use std::sync::Arc;

use agegate_store::session::{SessionStore, VerificationSession};
use agegate_store::shop::ShopStore;
use agegate_store::StoreError;
use agegate_types::{
    Clock, RecordId, ServiceParams, SessionId, SessionStatus, ShopId, VerificationOutcome,
};
use rand::RngCore;

use crate::error::VerificationError;

/// How a terminal record affected its owning session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionAdvance {
    /// The session moved to Completed.
    Completed,
    /// The record is terminal but not a success; the session stays open so
    /// the visitor can retry or switch method within the TTL.
    StillOpen,
    /// The session expired before the result arrived. The record stands
    /// for audit, but the result is moot for this session.
    Moot,
    /// No session references this record.
    Unlinked,
}

pub struct SessionManager {
    shops: Arc<dyn ShopStore>,
    sessions: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    params: ServiceParams,
}

impl SessionManager {
    pub fn new(
        shops: Arc<dyn ShopStore>,
        sessions: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        params: ServiceParams,
    ) -> Self {
        Self {
            shops,
            sessions,
            clock,
            params,
        }
    }

    /// Validate the shop and open a fresh pending session.
    pub fn create_session(
        &self,
        shop: &ShopId,
    ) -> Result<VerificationSession, VerificationError> {
        let info = self.shops.get_shop(shop).map_err(|e| match e {
            StoreError::NotFound(_) => VerificationError::ShopNotFound(shop.to_string()),
            other => VerificationError::Store(other),
        })?;
        if !info.active {
            return Err(VerificationError::ShopInactive(shop.to_string()));
        }

        let now = self.clock.now();
        let session = VerificationSession {
            id: SessionId::generate(),
            shop: shop.clone(),
            status: SessionStatus::Pending,
            created_at: now,
            expires_at: now.plus_secs(self.params.session_ttl_secs),
            record: None,
            pairing_token: pairing_token(),
        };
        self.sessions.create_session(&session)?;
        tracing::info!(session = %session.id, shop = %shop, expires_at = %session.expires_at, "session created");
        Ok(session)
    }

    /// Current view of a session. An elapsed TTL is persisted before it is
    /// reported, so the expiry is durable from the first observation.
    pub fn session_status(
        &self,
        id: &SessionId,
    ) -> Result<VerificationSession, VerificationError> {
        self.live_session(id)
    }

    /// Link a verification record to the session, optionally advancing the
    /// session status. Called by method adapters once an attempt has
    /// started (or produced) a record.
    pub fn attach_verification(
        &self,
        id: &SessionId,
        record: &RecordId,
        status: Option<SessionStatus>,
    ) -> Result<VerificationSession, VerificationError> {
        self.live_session(id)?;
        let mut session = self.sessions.attach_record(id, record)?;
        if let Some(to) = status {
            session = self.sessions.advance_session(id, to)?;
        }
        Ok(session)
    }

    /// Pairing confirmation from the secondary device: validates the token
    /// from the scanned URL and moves the session to Paired.
    pub fn confirm_pairing(
        &self,
        id: &SessionId,
        token: &str,
    ) -> Result<VerificationSession, VerificationError> {
        let session = self.live_session(id)?;
        if session.pairing_token != token {
            return Err(VerificationError::Validation(
                "pairing token does not match this session".into(),
            ));
        }
        let session = self.sessions.advance_session(id, SessionStatus::Paired)?;
        tracing::info!(session = %id, "cross-device pairing confirmed");
        Ok(session)
    }

    /// React to a record reaching its terminal status.
    ///
    /// Only a Success outcome completes the session; any other terminal
    /// outcome leaves it open for another attempt. An expired session is
    /// never advanced — the caller is told the result is moot.
    pub fn complete_for_record(
        &self,
        record: &RecordId,
        outcome: VerificationOutcome,
    ) -> Result<SessionAdvance, VerificationError> {
        let Some(session) = self.sessions.find_by_record(record)? else {
            return Ok(SessionAdvance::Unlinked);
        };

        if session.status == SessionStatus::Completed {
            return Ok(SessionAdvance::Completed);
        }
        let now = self.clock.now();
        if session.status == SessionStatus::Expired || session.ttl_elapsed(now) {
            self.sessions.expire_session(&session.id)?;
            tracing::warn!(session = %session.id, record = %record, "result arrived after expiry; session not advanced");
            return Ok(SessionAdvance::Moot);
        }

        if outcome != VerificationOutcome::Success {
            return Ok(SessionAdvance::StillOpen);
        }

        self.sessions
            .advance_session(&session.id, SessionStatus::Completed)?;
        tracing::info!(session = %session.id, record = %record, "session completed");
        Ok(SessionAdvance::Completed)
    }

    /// Fetch the session, persisting (and reporting) expiry if its TTL has
    /// elapsed. Unknown ids are reported, never treated as fresh.
    fn live_session(&self, id: &SessionId) -> Result<VerificationSession, VerificationError> {
        let session = self.sessions.get_session(id).map_err(|e| match e {
            StoreError::NotFound(_) => VerificationError::SessionNotFound(id.to_string()),
            other => VerificationError::Store(other),
        })?;

        if session.status == SessionStatus::Expired {
            return Err(VerificationError::SessionExpired(id.to_string()));
        }
        // A completed session is immutable; the TTL no longer applies.
        if session.status == SessionStatus::Completed {
            return Ok(session);
        }
        if session.ttl_elapsed(self.clock.now()) {
            self.sessions.expire_session(id)?;
            tracing::debug!(session = %id, "session expired on read");
            return Err(VerificationError::SessionExpired(id.to_string()));
        }
        Ok(session)
    }
}

fn pairing_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
