use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use chronos_planning::{Identity, Navigation, WeekWrap};
use chronos_shared::{Collection, Document, Fields, FixedClock, Filter, SharedClock};
use chronos_store::{DocumentStore, MemoryStore};
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::broadcast;

/// Memory store that counts writes.
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    creates: AtomicUsize,
    updates: AtomicUsize,
}

#[allow(dead_code)]
impl CountingStore {
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DocumentStore for CountingStore {
    async fn query(
        &self,
        collection: Collection,
        filters: &[Filter],
    ) -> chronos_shared::Result<Vec<Document>> {
        self.inner.query(collection, filters).await
    }

    async fn create(
        &self,
        collection: Collection,
        fields: Fields,
    ) -> chronos_shared::Result<String> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create(collection, fields).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> chronos_shared::Result<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(collection, id, fields).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> chronos_shared::Result<()> {
        self.inner.delete(collection, id).await
    }

    fn changes(&self) -> broadcast::Receiver<Collection> {
        self.inner.changes()
    }
}

pub struct TestState {
    pub store: Arc<CountingStore>,
    pub clock: SharedClock,
    pub identity: Identity,
    #[allow(dead_code)]
    pub navigation: Navigation,
}

/// Signed in as `john` with "now" pinned to `now`.
pub fn setup_test_state(now: OffsetDateTime) -> TestState {
    setup_test_state_with(now, WeekWrap::Fixed)
}

pub fn setup_test_state_with(now: OffsetDateTime, week_wrap: WeekWrap) -> TestState {
    let clock: SharedClock = Arc::new(FixedClock(now));

    TestState {
        store: Arc::new(CountingStore::default()),
        navigation: Navigation::new(clock.clone(), week_wrap),
        clock,
        identity: Identity::signed_in("john"),
    }
}

#[allow(dead_code)]
pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => panic!("not an object"),
    }
}
