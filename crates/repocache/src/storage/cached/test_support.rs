//! Call-counting doubles around the reference store and cache.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use repocache_core::cache::{
    Cache, CacheKey, Fingerprint, KeyList, PageResult, Result as CacheResult,
};
use repocache_core::entity::{Entity, MetadataCatalog, PrimaryKey};
use repocache_core::query::{
    Criteria, Direction, InCondition, Page, RawStatement, ReduceCondition, RefreshCondition, Row,
};
use repocache_core::storage::{Result, Store, StoreError};

use super::CachedRepository;
use crate::cache::MemoryCache;
use crate::fixtures::Order;
use crate::storage::InMemoryStore;

/// Routes `RUST_LOG`-filtered logs to the test output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::SeqCst);
}

/// Store that counts calls and can answer raw statements with canned results.
pub struct CountingStore {
    inner: InMemoryStore,
    pub calls: AtomicUsize,
    pub gets: AtomicUsize,
    pub lists: AtomicUsize,
    pub finds: AtomicUsize,
    pub writes: AtomicUsize,
    pub last_in: Mutex<Option<InCondition>>,
    rows: Option<Vec<Row>>,
    listing: Option<Vec<Value>>,
    execute_result: Option<bool>,
}

impl CountingStore {
    pub fn new(catalog: Arc<MetadataCatalog>) -> Self {
        Self {
            inner: InMemoryStore::new(catalog),
            calls: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
            lists: AtomicUsize::new(0),
            finds: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            last_in: Mutex::new(None),
            rows: None,
            listing: None,
            execute_result: None,
        }
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = Some(rows);
        self
    }

    /// Answers `list_all` with these rows instead of the wrapped store's.
    pub fn with_listing(mut self, listing: Vec<Value>) -> Self {
        self.listing = Some(listing);
        self
    }

    pub fn with_execute_result(mut self, result: bool) -> Self {
        self.execute_result = Some(result);
        self
    }

    /// The wrapped store, for out-of-band changes that bypass the counters.
    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    fn record(&self, counter: &AtomicUsize) {
        bump(&self.calls);
        bump(counter);
    }
}

#[async_trait]
impl Store for CountingStore {
    async fn get<T: Entity>(&self, id: &PrimaryKey) -> Result<Option<T>> {
        self.record(&self.gets);
        self.inner.get(id).await
    }

    async fn list<T: Entity>(&self, condition: &T) -> Result<Vec<T>> {
        self.record(&self.lists);
        self.inner.list(condition).await
    }

    async fn list_by_criteria<T: Entity>(&self, criteria: &Criteria) -> Result<Vec<T>> {
        self.record(&self.lists);
        self.inner.list_by_criteria(criteria).await
    }

    async fn list_all<T: Entity>(&self) -> Result<Vec<T>> {
        self.record(&self.lists);
        match &self.listing {
            Some(listing) => listing
                .iter()
                .map(|row| {
                    serde_json::from_value(row.clone())
                        .map_err(|err| StoreError::Serialization(err.to_string()))
                })
                .collect(),
            None => self.inner.list_all().await,
        }
    }

    async fn get_one<T: Entity>(
        &self,
        condition: &T,
        order_by: &str,
        direction: Direction,
    ) -> Result<Option<T>> {
        self.record(&self.lists);
        self.inner.get_one(condition, order_by, direction).await
    }

    async fn find<T: Entity>(&self, criteria: &Criteria) -> Result<Page<T>> {
        self.record(&self.finds);
        self.inner.find(criteria).await
    }

    async fn create<T: Entity>(&self, entity: &T) -> Result<PrimaryKey> {
        self.record(&self.writes);
        self.inner.create(entity).await
    }

    async fn create_batch<T: Entity>(&self, entities: &[T]) -> Result<bool> {
        self.record(&self.writes);
        self.inner.create_batch(entities).await
    }

    async fn refresh<T: Entity>(&self, entity: &T) -> Result<bool> {
        self.record(&self.writes);
        self.inner.refresh(entity).await
    }

    async fn refresh_by_condition<T: Entity>(&self, update: &RefreshCondition<T>) -> Result<bool> {
        self.record(&self.writes);
        self.inner.refresh_by_condition(update).await
    }

    async fn remove<T: Entity>(&self, entity: &T) -> Result<bool> {
        self.record(&self.writes);
        self.inner.remove(entity).await
    }

    async fn list_in<T: Entity>(&self, condition: &InCondition) -> Result<Vec<T>> {
        self.record(&self.lists);
        *self.last_in.lock().unwrap() = Some(condition.clone());
        self.inner.list_in(condition).await
    }

    async fn execute<T: Entity>(&self, entity: &T, statement: &RawStatement) -> Result<bool> {
        self.record(&self.writes);
        match self.execute_result {
            Some(result) => Ok(result),
            None => self.inner.execute(entity, statement).await,
        }
    }

    async fn list_rows<T: Entity>(&self, statement: &RawStatement) -> Result<Vec<Row>> {
        self.record(&self.lists);
        match &self.rows {
            Some(rows) => Ok(rows.clone()),
            None => self.inner.list_rows::<T>(statement).await,
        }
    }

    async fn find_rows<T: Entity>(&self, criteria: &Criteria) -> Result<Page<Row>> {
        self.record(&self.finds);
        self.inner.find_rows::<T>(criteria).await
    }

    async fn list_rows_by_criteria<T: Entity>(&self, criteria: &Criteria) -> Result<Vec<Row>> {
        self.record(&self.lists);
        self.inner.list_rows_by_criteria::<T>(criteria).await
    }

    async fn reduce<T: Entity>(&self, reduce: &ReduceCondition) -> Result<Value> {
        bump(&self.calls);
        self.inner.reduce::<T>(reduce).await
    }
}

/// Cache that counts calls and can scramble bulk-get order.
pub struct CountingCache {
    inner: MemoryCache,
    pub calls: AtomicUsize,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
    pub bulk_gets: AtomicUsize,
    pub removes: AtomicUsize,
    pub remove_alls: AtomicUsize,
    pub marks: AtomicUsize,
    reverse_bulk: AtomicBool,
}

impl CountingCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: MemoryCache::new(max_entries),
            calls: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
            sets: AtomicUsize::new(0),
            bulk_gets: AtomicUsize::new(0),
            removes: AtomicUsize::new(0),
            remove_alls: AtomicUsize::new(0),
            marks: AtomicUsize::new(0),
            reverse_bulk: AtomicBool::new(false),
        }
    }

    /// Makes `get_many` return payloads in reverse order from now on.
    pub fn reverse_bulk_order(&self) {
        self.reverse_bulk.store(true, Ordering::SeqCst);
    }

    /// The wrapped cache, for direct slot manipulation without counting.
    pub fn inner(&self) -> &MemoryCache {
        &self.inner
    }

    fn record(&self, counter: &AtomicUsize) {
        bump(&self.calls);
        bump(counter);
    }
}

#[async_trait]
impl Cache for CountingCache {
    async fn get(&self, type_name: &str, key: &str) -> CacheResult<Option<Vec<u8>>> {
        self.record(&self.gets);
        self.inner.get(type_name, key).await
    }

    async fn set(&self, type_name: &str, key: &str, value: &[u8]) -> CacheResult<()> {
        self.record(&self.sets);
        self.inner.set(type_name, key, value).await
    }

    async fn get_many(&self, type_name: &str, keys: &[CacheKey]) -> CacheResult<Vec<Vec<u8>>> {
        self.record(&self.bulk_gets);
        let mut payloads = self.inner.get_many(type_name, keys).await?;
        if self.reverse_bulk.load(Ordering::SeqCst) {
            payloads.reverse();
        }
        Ok(payloads)
    }

    async fn remove(&self, type_name: &str, key: &str) -> CacheResult<()> {
        self.record(&self.removes);
        self.inner.remove(type_name, key).await
    }

    async fn remove_all(&self, type_name: &str) -> CacheResult<()> {
        self.record(&self.remove_alls);
        self.inner.remove_all(type_name).await
    }

    async fn mark_for_refresh(&self, type_name: &str) -> CacheResult<()> {
        self.record(&self.marks);
        self.inner.mark_for_refresh(type_name).await
    }

    async fn get_key_list(
        &self,
        type_name: &str,
        fingerprint: &Fingerprint,
    ) -> CacheResult<Option<KeyList>> {
        self.record(&self.gets);
        self.inner.get_key_list(type_name, fingerprint).await
    }

    async fn set_key_list(
        &self,
        type_name: &str,
        fingerprint: &Fingerprint,
        keys: &KeyList,
    ) -> CacheResult<()> {
        self.record(&self.sets);
        self.inner.set_key_list(type_name, fingerprint, keys).await
    }

    async fn get_page(
        &self,
        type_name: &str,
        fingerprint: &Fingerprint,
    ) -> CacheResult<Option<PageResult>> {
        self.record(&self.gets);
        self.inner.get_page(type_name, fingerprint).await
    }

    async fn set_page(
        &self,
        type_name: &str,
        fingerprint: &Fingerprint,
        page: &PageResult,
    ) -> CacheResult<()> {
        self.record(&self.sets);
        self.inner.set_page(type_name, fingerprint, page).await
    }

    async fn get_rows(
        &self,
        type_name: &str,
        fingerprint: &Fingerprint,
    ) -> CacheResult<Option<Vec<Row>>> {
        self.record(&self.gets);
        self.inner.get_rows(type_name, fingerprint).await
    }

    async fn set_rows(
        &self,
        type_name: &str,
        fingerprint: &Fingerprint,
        rows: &[Row],
    ) -> CacheResult<()> {
        self.record(&self.sets);
        self.inner.set_rows(type_name, fingerprint, rows).await
    }
}

pub type TestRepository = CachedRepository<CountingStore, CountingCache>;

/// A repository bound to fresh counting doubles sharing one catalog.
pub struct Harness {
    pub repo: TestRepository,
    pub store: Arc<CountingStore>,
    pub cache: Arc<CountingCache>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(MetadataCatalog::new(), |store| store)
    }

    pub fn with(
        catalog: MetadataCatalog,
        configure: impl FnOnce(CountingStore) -> CountingStore,
    ) -> Self {
        init_tracing();
        let catalog = Arc::new(catalog);
        let store = Arc::new(configure(CountingStore::new(catalog.clone())));
        let cache = Arc::new(CountingCache::new(1024));
        let repo = CachedRepository::new(catalog);
        repo.bind_store(store.clone()).unwrap();
        repo.bind_cache(cache.clone()).unwrap();
        Self { repo, store, cache }
    }

    /// Inserts open orders with the given ids directly into the store.
    pub async fn seed_orders(&self, ids: &[i64]) {
        for &id in ids {
            self.store
                .inner()
                .create(&Order::new(id, "open", id * 10))
                .await
                .unwrap();
        }
    }

    /// Deletes an order directly from the store, leaving every cache slot intact.
    pub async fn delete_out_of_band(&self, id: i64) {
        let removed = self
            .store
            .inner()
            .remove(&Order::new(id, "", 0))
            .await
            .unwrap();
        assert!(removed, "order {} was not in the store", id);
    }
}

pub fn ids(orders: &[Order]) -> Vec<i64> {
    orders.iter().map(|o| o.id).collect()
}
