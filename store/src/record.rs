//! Verification record storage trait.

use crate::StoreError;
use agegate_types::{
    Amount, Method, RecordId, RecordStatus, ShopId, SubjectId, Timestamp, VerificationOutcome,
};
use serde::{Deserialize, Serialize};

/// The durable outcome (or in-progress marker) of one verification attempt
/// via one method.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub id: RecordId,
    pub shop: ShopId,
    pub method: Method,
    pub status: RecordStatus,
    /// Set exactly once, together with the terminal status.
    pub outcome: Option<VerificationOutcome>,
    pub price: Amount,
    /// Human-readable result detail. A revalidation record's detail
    /// references the prior successful record it short-circuits on.
    pub detail: String,
    /// Caller-supplied end-user identifier, kept for revalidation lookups.
    pub subject: Option<SubjectId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl VerificationRecord {
    /// A fresh pending record for a just-started attempt.
    pub fn pending(
        id: RecordId,
        shop: ShopId,
        method: Method,
        price: Amount,
        subject: Option<SubjectId>,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            shop,
            method,
            status: RecordStatus::Pending,
            outcome: None,
            price,
            detail: String::new(),
            subject,
            created_at: now,
            updated_at: now,
        }
    }

    /// The terminal status an outcome maps to.
    pub fn terminal_status(outcome: VerificationOutcome) -> RecordStatus {
        match outcome {
            VerificationOutcome::Error => RecordStatus::Error,
            _ => RecordStatus::Completed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Trait for storing verification records.
///
/// `complete_record` is the one write-once transition: concurrent
/// completion attempts serialize inside the backend so exactly one wins
/// and every loser observes `AlreadyTerminal` with the record unchanged.
pub trait RecordStore: Send + Sync {
    /// Persist a fresh pending record. Errors with `Duplicate` if the id
    /// exists.
    fn create_record(&self, record: &VerificationRecord) -> Result<(), StoreError>;

    fn get_record(&self, id: &RecordId) -> Result<VerificationRecord, StoreError>;

    /// Set the outcome and matching terminal status, exactly once.
    fn complete_record(
        &self,
        id: &RecordId,
        outcome: VerificationOutcome,
        detail: &str,
        now: Timestamp,
    ) -> Result<VerificationRecord, StoreError>;

    /// The most recent record for `subject` with outcome Success, if any.
    /// Recency is by `updated_at`, then `created_at`.
    fn latest_success_for_subject(
        &self,
        subject: &SubjectId,
    ) -> Result<Option<VerificationRecord>, StoreError>;
}
