//! The pluggable method adapter seam.
//!
//! Every verification technique implements [`MethodAdapter`]: `initiate`
//! starts an attempt (pending record, plus whatever artifact the method
//! needs — an authorization URL, a pairing URL, or an immediate verdict),
//! and `resolve` turns method-specific evidence into the record's terminal
//! outcome. Adapters are dispatched by [`Method`] tag through the
//! [`MethodRegistry`]; no call site branches on method names.

use std::collections::HashMap;
use std::sync::Arc;

use agegate_store::record::{RecordStore, VerificationRecord};
use agegate_store::shop::ShopStore;
use agegate_store::StoreError;
use agegate_types::{
    Clock, Method, RecordId, ServiceParams, SessionId, SessionStatus, ShopId, SubjectId,
    VerificationOutcome,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::capture::Detection;
use crate::decision::Verdict;
use crate::error::VerificationError;
use crate::session::{SessionAdvance, SessionManager};

/// Method-independent inputs to `initiate`.
#[derive(Clone, Debug, Default)]
pub struct MethodInput {
    /// End-user identifier. Required by revalidation; stored on the record
    /// for any method so later revalidations can find it.
    pub subject: Option<SubjectId>,
}

/// What `initiate` hands back to the storefront layer.
#[derive(Clone, Debug, Default)]
pub struct Initiation {
    /// The pending (or, for revalidation, already terminal) record.
    pub record: Option<VerificationRecord>,
    /// Where to send the visitor (redirect-identity).
    pub authorization_url: Option<String>,
    /// What to render as a scannable code (cross-device).
    pub pairing_url: Option<String>,
    /// Immediate verdict (revalidation only).
    pub is_verified: Option<bool>,
}

/// Method-specific evidence handed to `resolve`.
#[derive(Clone, Debug)]
pub enum Evidence {
    /// Authorization code from the identity provider's callback.
    AuthorizationCode(String),
    /// Raw document image for text extraction.
    DocumentImage(Vec<u8>),
    /// One camera frame for live capture.
    CaptureFrame(Vec<u8>),
    /// A pre-computed detector result (secondary devices that run the
    /// detector locally submit these instead of raw frames).
    CaptureDetection(Detection),
}

/// Result of a `resolve` call.
#[derive(Clone, Debug)]
pub enum Resolution {
    /// Live capture needs more frames before it can decide.
    InProgress {
        samples_collected: u32,
        samples_needed: u32,
    },
    Final(FinalResolution),
}

/// A terminal resolution.
#[derive(Clone, Debug)]
pub struct FinalResolution {
    pub record: VerificationRecord,
    /// Engine verdict, when the evidence reached the engine.
    pub verdict: Option<Verdict>,
    /// Age in whole years for exact evidence.
    pub age_years: Option<u32>,
    /// The owning session expired before this result: the record stands
    /// for audit, but the session was not advanced.
    pub session_moot: bool,
}

/// A pluggable verification method.
#[async_trait]
pub trait MethodAdapter: Send + Sync {
    /// The tag this adapter is dispatched under.
    fn method(&self) -> Method;

    /// Start an attempt for `shop`, linking it to `session` when given.
    async fn initiate(
        &self,
        shop: &ShopId,
        session: Option<&SessionId>,
        input: MethodInput,
    ) -> Result<Initiation, VerificationError>;

    /// Feed evidence to a pending attempt.
    async fn resolve(
        &self,
        record: &RecordId,
        evidence: Evidence,
    ) -> Result<Resolution, VerificationError>;
}

/// Adapters keyed by method tag.
#[derive(Default)]
pub struct MethodRegistry {
    adapters: HashMap<Method, Arc<dyn MethodAdapter>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Arc<dyn MethodAdapter>) {
        self.adapters.insert(adapter.method(), adapter);
    }

    pub fn get(&self, method: Method) -> Result<&Arc<dyn MethodAdapter>, VerificationError> {
        self.adapters.get(&method).ok_or_else(|| {
            VerificationError::Validation(format!("method {method} is not enabled"))
        })
    }
}

/// Shared dependencies injected into every adapter, with the record
/// bookkeeping every method performs the same way.
#[derive(Clone)]
pub struct AdapterDeps {
    pub shops: Arc<dyn ShopStore>,
    pub records: Arc<dyn RecordStore>,
    pub sessions: Arc<SessionManager>,
    pub clock: Arc<dyn Clock>,
    pub params: ServiceParams,
}

impl AdapterDeps {
    /// The shop, provided it exists and is active.
    pub fn validate_shop(
        &self,
        shop: &ShopId,
    ) -> Result<agegate_store::shop::ShopInfo, VerificationError> {
        let info = self.shops.get_shop(shop).map_err(|e| match e {
            StoreError::NotFound(_) => VerificationError::ShopNotFound(shop.to_string()),
            other => VerificationError::Store(other),
        })?;
        if !info.active {
            return Err(VerificationError::ShopInactive(shop.to_string()));
        }
        Ok(info)
    }

    /// Validate the shop, create the pending record, and link it to the
    /// session (which also moves the session to Paired — method selected).
    pub fn begin_attempt(
        &self,
        shop: &ShopId,
        session: Option<&SessionId>,
        method: Method,
        subject: Option<SubjectId>,
    ) -> Result<VerificationRecord, VerificationError> {
        self.validate_shop(shop)?;

        let record = VerificationRecord::pending(
            RecordId::generate(),
            shop.clone(),
            method,
            self.params.price(method),
            subject,
            self.clock.now(),
        );
        self.records.create_record(&record)?;

        if let Some(session_id) = session {
            self.sessions.attach_verification(
                session_id,
                &record.id,
                Some(SessionStatus::Paired),
            )?;
        }

        tracing::info!(record = %record.id, %method, shop = %shop, "verification attempt started");
        Ok(record)
    }

    /// Fetch a record that must still be open.
    pub fn open_record(&self, id: &RecordId) -> Result<VerificationRecord, VerificationError> {
        let record = self
            .records
            .get_record(id)
            .map_err(|e| VerificationError::record_lookup(e, id))?;
        if record.is_terminal() {
            return Err(VerificationError::AlreadyTerminal(id.to_string()));
        }
        Ok(record)
    }

    /// Write the terminal outcome and advance (or refuse to advance) the
    /// owning session. The record write happens first: an expired session
    /// still gets its audit record.
    pub fn finish_attempt(
        &self,
        id: &RecordId,
        outcome: VerificationOutcome,
        detail: &str,
        verdict: Option<Verdict>,
        age_years: Option<u32>,
    ) -> Result<FinalResolution, VerificationError> {
        let record = self
            .records
            .complete_record(id, outcome, detail, self.clock.now())
            .map_err(|e| match e {
                StoreError::AlreadyTerminal(_) => {
                    VerificationError::AlreadyTerminal(id.to_string())
                }
                other => VerificationError::record_lookup(other, id),
            })?;

        let advance = self.sessions.complete_for_record(id, outcome)?;
        let session_moot = advance == SessionAdvance::Moot;
        tracing::info!(record = %id, %outcome, moot = session_moot, "verification attempt finished");

        Ok(FinalResolution {
            record,
            verdict,
            age_years,
            session_moot,
        })
    }

    /// Today's calendar date according to the injected clock (UTC).
    pub fn today(&self) -> NaiveDate {
        DateTime::<Utc>::from_timestamp(self.clock.now().as_secs() as i64, 0)
            .map(|dt| dt.date_naive())
            .unwrap_or_default()
    }
}
