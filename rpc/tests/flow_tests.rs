//! End-to-end flows across the composed stack: session manager, method
//! adapters, record store, and the reconciliation worker, wired the same
//! way the daemon wires them (memory store + nullable capabilities).

use std::sync::Arc;

use agegate_nullables::{
    NullAgeDetector, NullBankGateway, NullClock, NullIdentityProvider, NullTextExtractor,
};
use agegate_store::company::{CompanyInfo, CompanyStore};
use agegate_store::record::{RecordStore, VerificationRecord};
use agegate_store::session::SessionStore;
use agegate_store::shop::{ShopInfo, ShopStore};
use agegate_store::wallet::WalletStore;
use agegate_store_memory::MemoryStore;
use agegate_types::{
    Amount, CompanyId, Method, RecordId, ServiceParams, SessionStatus, ShopId, SubjectId,
    Timestamp, TxStatus, VerificationOutcome,
};
use agegate_verification::capture::Detection;
use agegate_verification::method::{Evidence, MethodInput, MethodRegistry, Resolution};
use agegate_verification::{
    AdapterDeps, CrossDeviceAdapter, DocumentOcrAdapter, LiveCaptureAdapter,
    RedirectIdentityAdapter, RevalidationAdapter, SessionManager, VerificationError,
};
use agegate_wallet::{ReconcileStatus, ReconciliationWorker, TopUpService};
use chrono::NaiveDate;

/// 2026-08-01 00:00:00 UTC.
const NOW: u64 = 1_785_542_400;

struct Stack {
    store: Arc<MemoryStore>,
    clock: Arc<NullClock>,
    sessions: Arc<SessionManager>,
    registry: MethodRegistry,
    gateway: Arc<NullBankGateway>,
    topup: Arc<TopUpService>,
    worker: ReconciliationWorker,
}

fn stack(extracted_text: &str) -> Stack {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(NullClock::new(NOW));
    let params = ServiceParams::default();

    store
        .put_company(&CompanyInfo {
            id: CompanyId::new("co-1"),
            name: "ACME s.r.o.".into(),
        })
        .unwrap();
    store
        .put_shop(&ShopInfo {
            id: ShopId::new("shop-1"),
            company: CompanyId::new("co-1"),
            name: "Bottle & Cork".into(),
            active: true,
        })
        .unwrap();

    let sessions = Arc::new(SessionManager::new(
        store.clone(),
        store.clone(),
        clock.clone(),
        params.clone(),
    ));
    let deps = AdapterDeps {
        shops: store.clone(),
        records: store.clone(),
        sessions: sessions.clone(),
        clock: clock.clone(),
        params: params.clone(),
    };

    let mut registry = MethodRegistry::new();
    registry.register(Arc::new(RedirectIdentityAdapter::new(
        deps.clone(),
        Arc::new(NullIdentityProvider::adult()),
        None,
    )));
    registry.register(Arc::new(DocumentOcrAdapter::new(
        deps.clone(),
        Arc::new(NullTextExtractor::returning(extracted_text)),
    )));
    registry.register(Arc::new(LiveCaptureAdapter::new(
        deps.clone(),
        Arc::new(NullAgeDetector::steady(40.0)),
    )));
    registry.register(Arc::new(RevalidationAdapter::new(deps.clone())));
    registry.register(Arc::new(CrossDeviceAdapter::new(
        deps.clone(),
        "https://verify.example.com",
    )));

    let gateway = Arc::new(NullBankGateway::new());
    let topup = Arc::new(TopUpService::new(
        store.clone(),
        store.clone(),
        clock.clone(),
    ));
    let worker = ReconciliationWorker::new(
        gateway.clone(),
        store.clone(),
        clock.clone(),
        params,
    );

    Stack {
        store,
        clock,
        sessions,
        registry,
        gateway,
        topup,
        worker,
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 1).unwrap()
}

// ── Verification flows ───────────────────────────────────────────────────

#[tokio::test]
async fn dateless_document_fails_and_session_stays_open() {
    let stack = stack("MEMBER CARD 12345");
    let session = stack
        .sessions
        .create_session(&ShopId::new("shop-1"))
        .unwrap();

    let adapter = stack.registry.get(Method::DocumentOcr).unwrap();
    let started = adapter
        .initiate(
            &ShopId::new("shop-1"),
            Some(&session.id),
            MethodInput::default(),
        )
        .await
        .unwrap();
    let record = started.record.unwrap();

    let Resolution::Final(resolution) = adapter
        .resolve(&record.id, Evidence::DocumentImage(vec![0xFF]))
        .await
        .unwrap()
    else {
        panic!("document resolution is final");
    };

    assert_eq!(
        resolution.record.outcome,
        Some(VerificationOutcome::Failure)
    );
    assert_eq!(resolution.record.detail, "no birth date found");

    // The session remains paired — never completed with a success outcome.
    let stored = stack.store.get_session(&session.id).unwrap();
    assert_eq!(stored.status, SessionStatus::Paired);
}

#[tokio::test]
async fn successful_document_flow_completes_the_session() {
    let stack = stack("Jan Novak, born 15.03.1990");
    let session = stack
        .sessions
        .create_session(&ShopId::new("shop-1"))
        .unwrap();

    let adapter = stack.registry.get(Method::DocumentOcr).unwrap();
    let started = adapter
        .initiate(
            &ShopId::new("shop-1"),
            Some(&session.id),
            MethodInput::default(),
        )
        .await
        .unwrap();
    let record = started.record.unwrap();

    let Resolution::Final(resolution) = adapter
        .resolve(&record.id, Evidence::DocumentImage(vec![0xFF]))
        .await
        .unwrap()
    else {
        panic!("document resolution is final");
    };

    assert_eq!(
        resolution.record.outcome,
        Some(VerificationOutcome::Success)
    );
    assert_eq!(
        stack.store.get_session(&session.id).unwrap().status,
        SessionStatus::Completed
    );
}

#[tokio::test]
async fn revalidation_inherits_a_ten_day_old_success() {
    let stack = stack("");

    // A document success from ten days ago.
    let prior = VerificationRecord::pending(
        RecordId::new("prior-1"),
        ShopId::new("shop-1"),
        Method::DocumentOcr,
        Amount::new(10),
        Some(SubjectId::new("user-7")),
        Timestamp::new(NOW - 10 * 86_400),
    );
    stack.store.create_record(&prior).unwrap();
    stack
        .store
        .complete_record(
            &RecordId::new("prior-1"),
            VerificationOutcome::Success,
            "document birth date confirms age 36",
            Timestamp::new(NOW - 10 * 86_400 + 120),
        )
        .unwrap();

    let session = stack
        .sessions
        .create_session(&ShopId::new("shop-1"))
        .unwrap();
    let adapter = stack.registry.get(Method::Revalidation).unwrap();
    let initiation = adapter
        .initiate(
            &ShopId::new("shop-1"),
            Some(&session.id),
            MethodInput {
                subject: Some(SubjectId::new("user-7")),
            },
        )
        .await
        .unwrap();

    assert_eq!(initiation.is_verified, Some(true));
    let record = initiation.record.unwrap();
    assert!(record.detail.contains("prior-1"));
    // Cheaper than every fresh method.
    let params = ServiceParams::default();
    for fresh in [
        Method::RedirectIdentity,
        Method::DocumentOcr,
        Method::LiveCapture,
    ] {
        assert!(record.price < params.price(fresh));
    }
    assert_eq!(
        stack.store.get_session(&session.id).unwrap().status,
        SessionStatus::Completed
    );
}

#[tokio::test]
async fn revalidation_without_history_reports_unverified() {
    let stack = stack("");
    let adapter = stack.registry.get(Method::Revalidation).unwrap();
    let initiation = adapter
        .initiate(
            &ShopId::new("shop-1"),
            None,
            MethodInput {
                subject: Some(SubjectId::new("stranger")),
            },
        )
        .await
        .unwrap();

    assert_eq!(initiation.is_verified, Some(false));
    assert!(initiation.record.is_none());
}

#[tokio::test]
async fn cross_device_pairing_hands_off_to_live_capture() {
    let stack = stack("");
    let session = stack
        .sessions
        .create_session(&ShopId::new("shop-1"))
        .unwrap();

    // Primary device renders the pairing code.
    let cross = stack.registry.get(Method::CrossDevice).unwrap();
    let initiation = cross
        .initiate(
            &ShopId::new("shop-1"),
            Some(&session.id),
            MethodInput::default(),
        )
        .await
        .unwrap();
    let pairing_url = initiation.pairing_url.unwrap();
    assert!(pairing_url.contains(session.id.as_str()));

    // Secondary device scans the code and confirms pairing.
    stack
        .sessions
        .confirm_pairing(&session.id, &session.pairing_token)
        .unwrap();
    assert_eq!(
        stack.store.get_session(&session.id).unwrap().status,
        SessionStatus::Paired
    );

    // Evidence collection runs on the secondary device via live capture.
    let capture = stack.registry.get(Method::LiveCapture).unwrap();
    let started = capture
        .initiate(
            &ShopId::new("shop-1"),
            Some(&session.id),
            MethodInput::default(),
        )
        .await
        .unwrap();
    let record = started.record.unwrap();

    let mut last = None;
    for _ in 0..30 {
        last = Some(
            capture
                .resolve(
                    &record.id,
                    Evidence::CaptureDetection(Detection {
                        estimated_age: 40.0,
                        confidence: 0.95,
                        in_frame: true,
                    }),
                )
                .await
                .unwrap(),
        );
    }

    let Some(Resolution::Final(resolution)) = last else {
        panic!("30 weighted samples decide the run");
    };
    assert_eq!(
        resolution.record.outcome,
        Some(VerificationOutcome::Success)
    );
    assert_eq!(
        stack.store.get_session(&session.id).unwrap().status,
        SessionStatus::Completed
    );
}

#[tokio::test]
async fn expired_session_is_gone_for_every_caller() {
    let stack = stack("");
    let session = stack
        .sessions
        .create_session(&ShopId::new("shop-1"))
        .unwrap();

    stack.clock.advance(31 * 60);

    let err = stack.sessions.session_status(&session.id).unwrap_err();
    assert!(matches!(err, VerificationError::SessionExpired(_)));
    // The HTTP layer reports expiry as 410, distinct from a plain 404.
    assert!(matches!(
        agegate_rpc::RpcError::from(err),
        agegate_rpc::RpcError::Gone(_)
    ));

    // Starting an attempt against the expired session is refused too.
    let adapter = stack.registry.get(Method::DocumentOcr).unwrap();
    let result = adapter
        .initiate(
            &ShopId::new("shop-1"),
            Some(&session.id),
            MethodInput::default(),
        )
        .await;
    assert!(matches!(result, Err(VerificationError::SessionExpired(_))));
}

// ── Wallet flows ─────────────────────────────────────────────────────────

#[tokio::test]
async fn top_up_settles_once_the_transfer_arrives() {
    let stack = stack("");
    let tx = stack
        .topup
        .request_top_up(&CompanyId::new("co-1"), Amount::new(1_000))
        .unwrap();

    // Nothing on the statement yet.
    assert_eq!(
        stack.worker.reconcile(&tx.reference).await.unwrap(),
        ReconcileStatus::Pending
    );

    // The transfer shows up with the right reference and amount.
    stack.gateway.add_credit(tx.reference.as_str(), 1_000.0, today());
    assert_eq!(
        stack.worker.reconcile(&tx.reference).await.unwrap(),
        ReconcileStatus::Completed
    );
    assert_eq!(stack.topup.status(&tx.reference).unwrap(), TxStatus::Completed);

    // Re-delivery of the same statement line stays settled, no double
    // credit and no error.
    assert_eq!(
        stack.worker.reconcile(&tx.reference).await.unwrap(),
        ReconcileStatus::Completed
    );
}

#[tokio::test]
async fn wrong_amount_never_settles() {
    let stack = stack("");
    let tx = stack
        .topup
        .request_top_up(&CompanyId::new("co-1"), Amount::new(1_000))
        .unwrap();

    stack.gateway.add_credit(tx.reference.as_str(), 999.0, today());
    assert_eq!(
        stack.worker.reconcile(&tx.reference).await.unwrap(),
        ReconcileStatus::Pending
    );
    assert_eq!(stack.topup.status(&tx.reference).unwrap(), TxStatus::Pending);
}

#[tokio::test]
async fn sweep_and_on_demand_reconcile_coexist() {
    let stack = stack("");
    let tx = stack
        .topup
        .request_top_up(&CompanyId::new("co-1"), Amount::new(500))
        .unwrap();
    stack.gateway.add_credit(tx.reference.as_str(), 500.0, today());

    let outcome = stack.worker.sweep().await.unwrap();
    assert_eq!(outcome.settled, 1);

    // The user mashing "check now" after the sweep is a no-op.
    assert_eq!(
        stack.worker.reconcile(&tx.reference).await.unwrap(),
        ReconcileStatus::Completed
    );
}

#[tokio::test]
async fn completed_verification_is_billed_as_a_debit() {
    let stack = stack("Jan Novak, born 15.03.1990");
    let adapter = stack.registry.get(Method::DocumentOcr).unwrap();
    let started = adapter
        .initiate(&ShopId::new("shop-1"), None, MethodInput::default())
        .await
        .unwrap();
    let record = started.record.unwrap();
    adapter
        .resolve(&record.id, Evidence::DocumentImage(vec![0xFF]))
        .await
        .unwrap();

    // Billing is the rpc layer's hand-off; do it the way the handler does.
    let billed = stack
        .topup
        .bill(
            &CompanyId::new("co-1"),
            record.price,
            &format!("verification {} via {}", record.id, record.method),
        )
        .unwrap()
        .unwrap();
    let stored = stack.store.get_by_reference(&billed.reference).unwrap();
    assert_eq!(stored.status, TxStatus::Completed);
    assert_eq!(stored.amount, Amount::new(10));
}
