//! Shared test fixtures.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use agegate_store::shop::ShopInfo;
use agegate_store::ShopStore;
use agegate_store_memory::MemoryStore;
use agegate_types::{Clock, CompanyId, ServiceParams, ShopId, Timestamp};

use crate::method::AdapterDeps;
use crate::session::SessionManager;

/// A clock that only moves when told to.
pub(crate) struct TestClock(AtomicU64);

impl TestClock {
    pub(crate) fn at(secs: u64) -> Arc<Self> {
        Arc::new(Self(AtomicU64::new(secs)))
    }

    pub(crate) fn advance(&self, secs: u64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for TestClock {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.0.load(Ordering::SeqCst))
    }
}

/// A store pre-seeded with one active and one inactive shop.
pub(crate) fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .put_shop(&ShopInfo {
            id: ShopId::new("shop-1"),
            company: CompanyId::new("co-1"),
            name: "Bottle & Cork".into(),
            active: true,
        })
        .unwrap();
    store
        .put_shop(&ShopInfo {
            id: ShopId::new("shop-dormant"),
            company: CompanyId::new("co-1"),
            name: "Closed Doors".into(),
            active: false,
        })
        .unwrap();
    store
}

pub(crate) fn deps_with(store: Arc<MemoryStore>, clock: Arc<TestClock>) -> AdapterDeps {
    let params = ServiceParams::default();
    let manager = Arc::new(SessionManager::new(
        store.clone(),
        store.clone(),
        clock.clone(),
        params.clone(),
    ));
    AdapterDeps {
        shops: store.clone(),
        records: store,
        sessions: manager,
        clock,
        params,
    }
}
