//! Wallet transaction storage trait.

use crate::StoreError;
use agegate_types::{Amount, CompanyId, Timestamp, TxKind, TxReference, TxStatus};
use serde::{Deserialize, Serialize};

/// A movement on a merchant company's prepaid balance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WalletTransaction {
    /// Externally-quotable reference; the key the reconciliation worker
    /// matches against bank statement lines.
    pub reference: TxReference,
    pub company: CompanyId,
    pub kind: TxKind,
    /// Positive, whole currency units.
    pub amount: Amount,
    pub status: TxStatus,
    pub description: String,
    pub created_at: Timestamp,
    pub settled_at: Option<Timestamp>,
}

impl WalletTransaction {
    /// A pending credit awaiting its bank transfer.
    pub fn pending_credit(
        reference: TxReference,
        company: CompanyId,
        amount: Amount,
        description: String,
        now: Timestamp,
    ) -> Self {
        Self {
            reference,
            company,
            kind: TxKind::Credit,
            amount,
            status: TxStatus::Pending,
            description,
            created_at: now,
            settled_at: None,
        }
    }

    /// An immediately-completed debit (verification billing).
    pub fn completed_debit(
        reference: TxReference,
        company: CompanyId,
        amount: Amount,
        description: String,
        now: Timestamp,
    ) -> Self {
        Self {
            reference,
            company,
            kind: TxKind::Debit,
            amount,
            status: TxStatus::Completed,
            description,
            created_at: now,
            settled_at: Some(now),
        }
    }
}

/// Trait for storing wallet transactions.
///
/// `settle` is the compare-and-swap Pending → Completed: applying the same
/// bank-statement line twice yields `AlreadySettled` the second time, never
/// a double credit.
pub trait WalletStore: Send + Sync {
    /// Persist a fresh transaction. Errors with `Duplicate` if the
    /// reference exists.
    fn create_transaction(&self, tx: &WalletTransaction) -> Result<(), StoreError>;

    fn get_by_reference(&self, reference: &TxReference)
        -> Result<WalletTransaction, StoreError>;

    /// Transition the transaction Pending → Completed, exactly once.
    fn settle(
        &self,
        reference: &TxReference,
        now: Timestamp,
    ) -> Result<WalletTransaction, StoreError>;

    /// Every credit still waiting for its bank transfer, oldest first.
    fn pending_credits(&self) -> Result<Vec<WalletTransaction>, StoreError>;
}
