use std::collections::HashMap;
use std::sync::Mutex;

use agegate_store::company::{CompanyInfo, CompanyStore};
use agegate_store::record::{RecordStore, VerificationRecord};
use agegate_store::session::{SessionStore, VerificationSession};
use agegate_store::shop::{ShopInfo, ShopStore};
use agegate_store::wallet::{WalletStore, WalletTransaction};
use agegate_store::StoreError;
use agegate_types::{
    CompanyId, RecordId, SessionId, SessionStatus, ShopId, SubjectId, Timestamp, TxKind,
    TxReference, TxStatus, VerificationOutcome,
};

/// A thread-safe in-memory store backing all five storage traits.
pub struct MemoryStore {
    shops: Mutex<HashMap<String, ShopInfo>>,
    companies: Mutex<HashMap<String, CompanyInfo>>,
    sessions: Mutex<HashMap<String, VerificationSession>>,
    records: Mutex<HashMap<String, VerificationRecord>>,
    transactions: Mutex<HashMap<String, WalletTransaction>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            shops: Mutex::new(HashMap::new()),
            companies: Mutex::new(HashMap::new()),
            sessions: Mutex::new(HashMap::new()),
            records: Mutex::new(HashMap::new()),
            transactions: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ShopStore for MemoryStore {
    fn get_shop(&self, id: &ShopId) -> Result<ShopInfo, StoreError> {
        self.shops
            .lock()
            .unwrap()
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn put_shop(&self, shop: &ShopInfo) -> Result<(), StoreError> {
        self.shops
            .lock()
            .unwrap()
            .insert(shop.id.to_string(), shop.clone());
        Ok(())
    }
}

impl CompanyStore for MemoryStore {
    fn get_company(&self, id: &CompanyId) -> Result<CompanyInfo, StoreError> {
        self.companies
            .lock()
            .unwrap()
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn put_company(&self, company: &CompanyInfo) -> Result<(), StoreError> {
        self.companies
            .lock()
            .unwrap()
            .insert(company.id.to_string(), company.clone());
        Ok(())
    }
}

impl SessionStore for MemoryStore {
    fn create_session(&self, session: &VerificationSession) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.contains_key(session.id.as_str()) {
            return Err(StoreError::Duplicate(session.id.to_string()));
        }
        sessions.insert(session.id.to_string(), session.clone());
        Ok(())
    }

    fn get_session(&self, id: &SessionId) -> Result<VerificationSession, StoreError> {
        self.sessions
            .lock()
            .unwrap()
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn advance_session(
        &self,
        id: &SessionId,
        to: SessionStatus,
    ) -> Result<VerificationSession, StoreError> {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if session.status == to {
            return Ok(session.clone());
        }
        if !session.status.allows_transition_to(to) {
            return Err(StoreError::IllegalTransition {
                entity: "session",
                from: session.status.to_string(),
                to: to.to_string(),
            });
        }
        session.status = to;
        Ok(session.clone())
    }

    fn attach_record(
        &self,
        id: &SessionId,
        record: &RecordId,
    ) -> Result<VerificationSession, StoreError> {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        match &session.record {
            None => session.record = Some(record.clone()),
            Some(existing) if existing == record => {}
            Some(existing) => {
                return Err(StoreError::Duplicate(format!(
                    "session {id} is already linked to record {existing}"
                )));
            }
        }
        Ok(session.clone())
    }

    fn expire_session(&self, id: &SessionId) -> Result<VerificationSession, StoreError> {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if !session.status.is_terminal() {
            session.status = SessionStatus::Expired;
        }
        Ok(session.clone())
    }

    fn find_by_record(
        &self,
        record: &RecordId,
    ) -> Result<Option<VerificationSession>, StoreError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .values()
            .find(|s| s.record.as_ref() == Some(record))
            .cloned())
    }
}

impl RecordStore for MemoryStore {
    fn create_record(&self, record: &VerificationRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(record.id.as_str()) {
            return Err(StoreError::Duplicate(record.id.to_string()));
        }
        records.insert(record.id.to_string(), record.clone());
        Ok(())
    }

    fn get_record(&self, id: &RecordId) -> Result<VerificationRecord, StoreError> {
        self.records
            .lock()
            .unwrap()
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn complete_record(
        &self,
        id: &RecordId,
        outcome: VerificationOutcome,
        detail: &str,
        now: Timestamp,
    ) -> Result<VerificationRecord, StoreError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if record.is_terminal() {
            return Err(StoreError::AlreadyTerminal(id.to_string()));
        }
        record.status = VerificationRecord::terminal_status(outcome);
        record.outcome = Some(outcome);
        record.detail = detail.to_string();
        record.updated_at = now;
        Ok(record.clone())
    }

    fn latest_success_for_subject(
        &self,
        subject: &SubjectId,
    ) -> Result<Option<VerificationRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| {
                r.subject.as_ref() == Some(subject)
                    && r.outcome == Some(VerificationOutcome::Success)
            })
            .max_by_key(|r| (r.updated_at, r.created_at))
            .cloned())
    }
}

impl WalletStore for MemoryStore {
    fn create_transaction(&self, tx: &WalletTransaction) -> Result<(), StoreError> {
        let mut transactions = self.transactions.lock().unwrap();
        if transactions.contains_key(tx.reference.as_str()) {
            return Err(StoreError::Duplicate(tx.reference.to_string()));
        }
        transactions.insert(tx.reference.to_string(), tx.clone());
        Ok(())
    }

    fn get_by_reference(
        &self,
        reference: &TxReference,
    ) -> Result<WalletTransaction, StoreError> {
        self.transactions
            .lock()
            .unwrap()
            .get(reference.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(reference.to_string()))
    }

    fn settle(
        &self,
        reference: &TxReference,
        now: Timestamp,
    ) -> Result<WalletTransaction, StoreError> {
        let mut transactions = self.transactions.lock().unwrap();
        let tx = transactions
            .get_mut(reference.as_str())
            .ok_or_else(|| StoreError::NotFound(reference.to_string()))?;

        match tx.status {
            TxStatus::Pending => {
                tx.status = TxStatus::Completed;
                tx.settled_at = Some(now);
                Ok(tx.clone())
            }
            TxStatus::Completed => Err(StoreError::AlreadySettled(reference.to_string())),
            TxStatus::Failed => Err(StoreError::IllegalTransition {
                entity: "transaction",
                from: tx.status.to_string(),
                to: TxStatus::Completed.to_string(),
            }),
        }
    }

    fn pending_credits(&self) -> Result<Vec<WalletTransaction>, StoreError> {
        let mut pending: Vec<WalletTransaction> = self
            .transactions
            .lock()
            .unwrap()
            .values()
            .filter(|tx| tx.kind == TxKind::Credit && tx.status == TxStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|tx| tx.created_at);
        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agegate_types::{Amount, Method};
    use std::sync::Arc;

    fn shop(id: &str) -> ShopInfo {
        ShopInfo {
            id: ShopId::new(id),
            company: CompanyId::new("co-1"),
            name: "Test Shop".into(),
            active: true,
        }
    }

    fn session(id: &str) -> VerificationSession {
        VerificationSession {
            id: SessionId::new(id),
            shop: ShopId::new("shop-1"),
            status: SessionStatus::Pending,
            created_at: Timestamp::new(1_000),
            expires_at: Timestamp::new(1_000 + 1_800),
            record: None,
            pairing_token: "tok".into(),
        }
    }

    fn record(id: &str, subject: Option<&str>) -> VerificationRecord {
        VerificationRecord::pending(
            RecordId::new(id),
            ShopId::new("shop-1"),
            Method::DocumentOcr,
            Amount::new(10),
            subject.map(SubjectId::new),
            Timestamp::new(1_000),
        )
    }

    fn credit(reference: &str, amount: u64) -> WalletTransaction {
        WalletTransaction::pending_credit(
            TxReference::new(reference),
            CompanyId::new("co-1"),
            Amount::new(amount),
            "top-up".into(),
            Timestamp::new(1_000),
        )
    }

    // ── Directory ──────────────────────────────────────────────────────

    #[test]
    fn put_get_shop_round_trip() {
        let store = MemoryStore::new();
        store.put_shop(&shop("shop-1")).unwrap();
        let loaded = store.get_shop(&ShopId::new("shop-1")).unwrap();
        assert!(loaded.active);
    }

    #[test]
    fn missing_shop_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get_shop(&ShopId::new("nope")),
            Err(StoreError::NotFound(_))
        ));
    }

    // ── Sessions ───────────────────────────────────────────────────────

    #[test]
    fn duplicate_session_id_rejected() {
        let store = MemoryStore::new();
        store.create_session(&session("s1")).unwrap();
        assert!(matches!(
            store.create_session(&session("s1")),
            Err(StoreError::Duplicate(_))
        ));
    }

    #[test]
    fn advance_is_forward_only() {
        let store = MemoryStore::new();
        store.create_session(&session("s1")).unwrap();
        let id = SessionId::new("s1");

        store.advance_session(&id, SessionStatus::Paired).unwrap();
        let err = store
            .advance_session(&id, SessionStatus::Pending)
            .unwrap_err();
        assert!(matches!(err, StoreError::IllegalTransition { .. }));
    }

    #[test]
    fn advance_to_current_status_is_noop() {
        let store = MemoryStore::new();
        store.create_session(&session("s1")).unwrap();
        let id = SessionId::new("s1");

        store.advance_session(&id, SessionStatus::Paired).unwrap();
        let again = store.advance_session(&id, SessionStatus::Paired).unwrap();
        assert_eq!(again.status, SessionStatus::Paired);
    }

    #[test]
    fn completed_session_refuses_expiry_via_advance() {
        let store = MemoryStore::new();
        store.create_session(&session("s1")).unwrap();
        let id = SessionId::new("s1");

        store.advance_session(&id, SessionStatus::Completed).unwrap();
        assert!(store
            .advance_session(&id, SessionStatus::Expired)
            .is_err());
    }

    #[test]
    fn expire_is_idempotent_and_skips_completed() {
        let store = MemoryStore::new();
        store.create_session(&session("s1")).unwrap();
        store.create_session(&session("s2")).unwrap();

        let s1 = SessionId::new("s1");
        store.expire_session(&s1).unwrap();
        let again = store.expire_session(&s1).unwrap();
        assert_eq!(again.status, SessionStatus::Expired);

        let s2 = SessionId::new("s2");
        store.advance_session(&s2, SessionStatus::Completed).unwrap();
        let untouched = store.expire_session(&s2).unwrap();
        assert_eq!(untouched.status, SessionStatus::Completed);
    }

    #[test]
    fn attach_record_sets_link_once() {
        let store = MemoryStore::new();
        store.create_session(&session("s1")).unwrap();
        let id = SessionId::new("s1");
        let rec = RecordId::new("r1");

        store.attach_record(&id, &rec).unwrap();
        // Same record again: no-op.
        store.attach_record(&id, &rec).unwrap();
        // Different record: refused.
        assert!(store.attach_record(&id, &RecordId::new("r2")).is_err());

        let found = store.find_by_record(&rec).unwrap().unwrap();
        assert_eq!(found.id, id);
    }

    // ── Records ────────────────────────────────────────────────────────

    #[test]
    fn complete_record_wins_exactly_once() {
        let store = MemoryStore::new();
        store.create_record(&record("r1", None)).unwrap();
        let id = RecordId::new("r1");

        let first = store
            .complete_record(&id, VerificationOutcome::Success, "ok", Timestamp::new(2_000))
            .unwrap();
        assert_eq!(first.outcome, Some(VerificationOutcome::Success));

        let second = store.complete_record(
            &id,
            VerificationOutcome::Failure,
            "late",
            Timestamp::new(3_000),
        );
        assert!(matches!(second, Err(StoreError::AlreadyTerminal(_))));

        // The record is unchanged by the losing call.
        let stored = store.get_record(&id).unwrap();
        assert_eq!(stored.outcome, Some(VerificationOutcome::Success));
        assert_eq!(stored.detail, "ok");
        assert_eq!(stored.updated_at, Timestamp::new(2_000));
    }

    #[test]
    fn concurrent_completion_has_a_single_winner() {
        let store = Arc::new(MemoryStore::new());
        store.create_record(&record("r1", None)).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store.complete_record(
                        &RecordId::new("r1"),
                        VerificationOutcome::Success,
                        &format!("winner {i}"),
                        Timestamp::new(2_000 + i as u64),
                    )
                })
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.is_ok())
            .count();
        assert_eq!(wins, 1);
    }

    #[test]
    fn error_outcome_maps_to_error_status() {
        let store = MemoryStore::new();
        store.create_record(&record("r1", None)).unwrap();
        let completed = store
            .complete_record(
                &RecordId::new("r1"),
                VerificationOutcome::Error,
                "extraction failed",
                Timestamp::new(2_000),
            )
            .unwrap();
        assert_eq!(completed.status, agegate_types::RecordStatus::Error);
    }

    #[test]
    fn latest_success_prefers_most_recent() {
        let store = MemoryStore::new();

        let mut old = record("r-old", Some("user-7"));
        old.created_at = Timestamp::new(100);
        store.create_record(&old).unwrap();
        store
            .complete_record(
                &RecordId::new("r-old"),
                VerificationOutcome::Success,
                "old",
                Timestamp::new(200),
            )
            .unwrap();

        let fresh = record("r-new", Some("user-7"));
        store.create_record(&fresh).unwrap();
        store
            .complete_record(
                &RecordId::new("r-new"),
                VerificationOutcome::Success,
                "new",
                Timestamp::new(5_000),
            )
            .unwrap();

        // A failure is never returned, whatever its recency.
        let failed = record("r-fail", Some("user-7"));
        store.create_record(&failed).unwrap();
        store
            .complete_record(
                &RecordId::new("r-fail"),
                VerificationOutcome::Failure,
                "too young",
                Timestamp::new(9_000),
            )
            .unwrap();

        let latest = store
            .latest_success_for_subject(&SubjectId::new("user-7"))
            .unwrap()
            .unwrap();
        assert_eq!(latest.id, RecordId::new("r-new"));
    }

    #[test]
    fn latest_success_for_unknown_subject_is_none() {
        let store = MemoryStore::new();
        assert!(store
            .latest_success_for_subject(&SubjectId::new("ghost"))
            .unwrap()
            .is_none());
    }

    // ── Wallet ─────────────────────────────────────────────────────────

    #[test]
    fn settle_transitions_pending_to_completed_once() {
        let store = MemoryStore::new();
        store.create_transaction(&credit("TOPUP-1", 1_000)).unwrap();
        let reference = TxReference::new("TOPUP-1");

        let settled = store.settle(&reference, Timestamp::new(2_000)).unwrap();
        assert_eq!(settled.status, TxStatus::Completed);
        assert_eq!(settled.settled_at, Some(Timestamp::new(2_000)));

        assert!(matches!(
            store.settle(&reference, Timestamp::new(3_000)),
            Err(StoreError::AlreadySettled(_))
        ));
    }

    #[test]
    fn concurrent_settle_credits_exactly_once() {
        let store = Arc::new(MemoryStore::new());
        store.create_transaction(&credit("TOPUP-1", 1_000)).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store.settle(&TxReference::new("TOPUP-1"), Timestamp::new(2_000))
                })
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.is_ok())
            .count();
        assert_eq!(wins, 1);
    }

    #[test]
    fn pending_credits_oldest_first_excludes_settled_and_debits() {
        let store = MemoryStore::new();

        let mut late = credit("TOPUP-late", 500);
        late.created_at = Timestamp::new(9_000);
        store.create_transaction(&late).unwrap();

        let mut early = credit("TOPUP-early", 700);
        early.created_at = Timestamp::new(100);
        store.create_transaction(&early).unwrap();

        store.create_transaction(&credit("TOPUP-done", 300)).unwrap();
        store
            .settle(&TxReference::new("TOPUP-done"), Timestamp::new(2_000))
            .unwrap();

        store
            .create_transaction(&WalletTransaction::completed_debit(
                TxReference::new("BILL-1"),
                CompanyId::new("co-1"),
                Amount::new(10),
                "verification".into(),
                Timestamp::new(50),
            ))
            .unwrap();

        let pending = store.pending_credits().unwrap();
        let refs: Vec<&str> = pending.iter().map(|t| t.reference.as_str()).collect();
        assert_eq!(refs, vec!["TOPUP-early", "TOPUP-late"]);
    }
}
