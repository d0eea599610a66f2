//! Top-up requests and verification billing.

use std::sync::Arc;

use agegate_store::company::CompanyStore;
use agegate_store::wallet::{WalletStore, WalletTransaction};
use agegate_store::StoreError;
use agegate_types::{Amount, Clock, CompanyId, TxReference, TxStatus};

use crate::error::WalletError;

pub struct TopUpService {
    companies: Arc<dyn CompanyStore>,
    wallet: Arc<dyn WalletStore>,
    clock: Arc<dyn Clock>,
}

impl TopUpService {
    pub fn new(
        companies: Arc<dyn CompanyStore>,
        wallet: Arc<dyn WalletStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            companies,
            wallet,
            clock,
        }
    }

    /// Open a pending credit and hand back the reference the merchant must
    /// quote in the bank transfer.
    pub fn request_top_up(
        &self,
        company: &CompanyId,
        amount: Amount,
    ) -> Result<WalletTransaction, WalletError> {
        self.companies.get_company(company).map_err(|e| match e {
            StoreError::NotFound(_) => WalletError::CompanyNotFound(company.to_string()),
            other => WalletError::Store(other),
        })?;
        if amount.is_zero() {
            return Err(WalletError::InvalidAmount(
                "top-up amount must be positive".into(),
            ));
        }

        let tx = WalletTransaction::pending_credit(
            TxReference::generate_topup(),
            company.clone(),
            amount,
            "wallet top-up by bank transfer".into(),
            self.clock.now(),
        );
        self.wallet.create_transaction(&tx)?;
        tracing::info!(reference = %tx.reference, company = %company, %amount, "top-up requested");
        Ok(tx)
    }

    /// Settlement status of a transaction, by its quotable reference.
    pub fn status(&self, reference: &TxReference) -> Result<TxStatus, WalletError> {
        let tx = self.wallet.get_by_reference(reference).map_err(|e| match e {
            StoreError::NotFound(_) => WalletError::TransactionNotFound(reference.to_string()),
            other => WalletError::Store(other),
        })?;
        Ok(tx.status)
    }

    /// Record a billed verification as an immediately-completed debit.
    /// Settlement timing against the balance is the billing collaborator's
    /// concern, not this core's. Free attempts produce no transaction.
    pub fn bill(
        &self,
        company: &CompanyId,
        amount: Amount,
        description: &str,
    ) -> Result<Option<WalletTransaction>, WalletError> {
        if amount.is_zero() {
            return Ok(None);
        }
        let tx = WalletTransaction::completed_debit(
            TxReference::generate_billing(),
            company.clone(),
            amount,
            description.into(),
            self.clock.now(),
        );
        self.wallet.create_transaction(&tx)?;
        tracing::debug!(reference = %tx.reference, company = %company, %amount, "verification billed");
        Ok(Some(tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agegate_store::company::CompanyInfo;
    use agegate_store_memory::MemoryStore;
    use agegate_types::{Timestamp, TxKind};

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now(&self) -> Timestamp {
            Timestamp::new(self.0)
        }
    }

    fn service() -> (TopUpService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store
            .put_company(&CompanyInfo {
                id: CompanyId::new("co-1"),
                name: "ACME s.r.o.".into(),
            })
            .unwrap();
        let service = TopUpService::new(store.clone(), store.clone(), Arc::new(FixedClock(5_000)));
        (service, store)
    }

    #[test]
    fn top_up_creates_pending_credit_with_quotable_reference() {
        let (service, _) = service();
        let tx = service
            .request_top_up(&CompanyId::new("co-1"), Amount::new(1_000))
            .unwrap();
        assert_eq!(tx.kind, TxKind::Credit);
        assert_eq!(tx.status, TxStatus::Pending);
        assert!(tx.reference.as_str().starts_with(TxReference::TOPUP_PREFIX));
        assert_eq!(service.status(&tx.reference).unwrap(), TxStatus::Pending);
    }

    #[test]
    fn unknown_company_is_reported() {
        let (service, _) = service();
        assert!(matches!(
            service.request_top_up(&CompanyId::new("ghost"), Amount::new(100)),
            Err(WalletError::CompanyNotFound(_))
        ));
    }

    #[test]
    fn zero_amount_is_invalid() {
        let (service, _) = service();
        assert!(matches!(
            service.request_top_up(&CompanyId::new("co-1"), Amount::ZERO),
            Err(WalletError::InvalidAmount(_))
        ));
    }

    #[test]
    fn unknown_reference_is_reported() {
        let (service, _) = service();
        assert!(matches!(
            service.status(&TxReference::new("TOPUP-NOPE")),
            Err(WalletError::TransactionNotFound(_))
        ));
    }

    #[test]
    fn billing_writes_a_completed_debit() {
        let (service, store) = service();
        let tx = service
            .bill(&CompanyId::new("co-1"), Amount::new(10), "document-ocr attempt")
            .unwrap()
            .unwrap();
        assert_eq!(tx.kind, TxKind::Debit);
        assert_eq!(tx.status, TxStatus::Completed);
        let stored = store.get_by_reference(&tx.reference).unwrap();
        assert_eq!(stored.settled_at, Some(Timestamp::new(5_000)));
    }

    #[test]
    fn free_attempts_are_not_billed() {
        let (service, _) = service();
        let billed = service
            .bill(&CompanyId::new("co-1"), Amount::ZERO, "cross-device pairing")
            .unwrap();
        assert!(billed.is_none());
    }
}
