//! In-memory cache implementation with LRU eviction.
//!
//! Object slots are tracked per type so a type can be evicted without
//! scanning. Query slots (key lists, pages, rows) are keyed by a per-type
//! generation: marking a type stale bumps its generation, which makes every
//! older query slot unreachable. The orphaned slots age out through LRU.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::RwLock;

use repocache_core::cache::{
    deserialize_key_list, deserialize_page, deserialize_rows, key_list_key, object_key, page_key,
    rows_key, serialize_key_list, serialize_page, serialize_rows, Cache, CacheError, CacheKey,
    Fingerprint, KeyList, PageResult, Result, SerializationError,
};
use repocache_core::query::Row;

/// In-memory cache implementation with LRU eviction.
///
/// Thread-safe cache using `Arc<RwLock<LruCache>>` for concurrent access.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    /// Main slot store with LRU eviction.
    store: Arc<RwLock<LruCache<String, Vec<u8>>>>,
    /// Object slot keys by type name, for `remove_all`.
    tracking: Arc<RwLock<HashMap<String, HashSet<String>>>>,
    /// Current query-slot generation by type name.
    generations: Arc<RwLock<HashMap<String, u64>>>,
}

impl MemoryCache {
    /// Creates a new in-memory cache with LRU eviction.
    ///
    /// A `max_entries` of 0 is treated as 1.
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            store: Arc::new(RwLock::new(LruCache::new(capacity))),
            tracking: Arc::new(RwLock::new(HashMap::new())),
            generations: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the current query-slot generation of a type.
    pub async fn generation(&self, type_name: &str) -> u64 {
        self.generations
            .read()
            .await
            .get(type_name)
            .copied()
            .unwrap_or(0)
    }

    /// Returns the number of live slots.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    /// Returns true when no slot is cached.
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    async fn read_slot(&self, slot: &str) -> Option<Vec<u8>> {
        // LRU lookups update recency, so they need the write lock.
        self.store.write().await.get(slot).cloned()
    }

    async fn write_slot(&self, slot: String, value: Vec<u8>) {
        self.store.write().await.put(slot, value);
    }
}

fn to_cache_error(err: SerializationError) -> CacheError {
    CacheError::Serialization(err.to_string())
}

/// An undecodable query slot degrades to a miss.
fn decode_or_miss<T>(
    type_name: &str,
    fingerprint: &Fingerprint,
    decoded: std::result::Result<T, SerializationError>,
) -> Option<T> {
    match decoded {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(type_name, %fingerprint, error = %err, "Cached query slot is corrupt");
            None
        }
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, type_name: &str, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.read_slot(&object_key(type_name, key)).await)
    }

    async fn set(&self, type_name: &str, key: &str, value: &[u8]) -> Result<()> {
        let slot = object_key(type_name, key);
        self.write_slot(slot.clone(), value.to_vec()).await;

        let mut tracking = self.tracking.write().await;
        tracking
            .entry(type_name.to_string())
            .or_default()
            .insert(slot);
        Ok(())
    }

    async fn get_many(&self, type_name: &str, keys: &[CacheKey]) -> Result<Vec<Vec<u8>>> {
        let mut store = self.store.write().await;
        Ok(keys
            .iter()
            .filter_map(|key| store.get(&object_key(type_name, key)).cloned())
            .collect())
    }

    async fn remove(&self, type_name: &str, key: &str) -> Result<()> {
        let slot = object_key(type_name, key);
        {
            let mut tracking = self.tracking.write().await;
            if let Some(slots) = tracking.get_mut(type_name) {
                slots.remove(&slot);
                if slots.is_empty() {
                    tracking.remove(type_name);
                }
            }
        }

        self.store.write().await.pop(&slot);
        Ok(())
    }

    async fn remove_all(&self, type_name: &str) -> Result<()> {
        let tracked = {
            let mut tracking = self.tracking.write().await;
            tracking.remove(type_name).unwrap_or_default()
        };

        if !tracked.is_empty() {
            let mut store = self.store.write().await;
            for slot in &tracked {
                store.pop(slot);
            }
        }
        Ok(())
    }

    async fn mark_for_refresh(&self, type_name: &str) -> Result<()> {
        let mut generations = self.generations.write().await;
        let generation = generations.entry(type_name.to_string()).or_insert(0);
        *generation += 1;
        tracing::trace!(type_name, generation = *generation, "Type marked for refresh");
        Ok(())
    }

    async fn get_key_list(
        &self,
        type_name: &str,
        fingerprint: &Fingerprint,
    ) -> Result<Option<KeyList>> {
        let generation = self.generation(type_name).await;
        match self
            .read_slot(&key_list_key(type_name, generation, fingerprint))
            .await
        {
            Some(bytes) => Ok(decode_or_miss(type_name, fingerprint, deserialize_key_list(&bytes))),
            None => Ok(None),
        }
    }

    async fn set_key_list(
        &self,
        type_name: &str,
        fingerprint: &Fingerprint,
        keys: &KeyList,
    ) -> Result<()> {
        let bytes = serialize_key_list(keys).map_err(to_cache_error)?;
        let generation = self.generation(type_name).await;
        self.write_slot(key_list_key(type_name, generation, fingerprint), bytes)
            .await;
        Ok(())
    }

    async fn get_page(
        &self,
        type_name: &str,
        fingerprint: &Fingerprint,
    ) -> Result<Option<PageResult>> {
        let generation = self.generation(type_name).await;
        match self
            .read_slot(&page_key(type_name, generation, fingerprint))
            .await
        {
            Some(bytes) => Ok(decode_or_miss(type_name, fingerprint, deserialize_page(&bytes))),
            None => Ok(None),
        }
    }

    async fn set_page(
        &self,
        type_name: &str,
        fingerprint: &Fingerprint,
        page: &PageResult,
    ) -> Result<()> {
        let bytes = serialize_page(page).map_err(to_cache_error)?;
        let generation = self.generation(type_name).await;
        self.write_slot(page_key(type_name, generation, fingerprint), bytes)
            .await;
        Ok(())
    }

    async fn get_rows(
        &self,
        type_name: &str,
        fingerprint: &Fingerprint,
    ) -> Result<Option<Vec<Row>>> {
        let generation = self.generation(type_name).await;
        match self
            .read_slot(&rows_key(type_name, generation, fingerprint))
            .await
        {
            Some(bytes) => Ok(decode_or_miss(type_name, fingerprint, deserialize_rows(&bytes))),
            None => Ok(None),
        }
    }

    async fn set_rows(
        &self,
        type_name: &str,
        fingerprint: &Fingerprint,
        rows: &[Row],
    ) -> Result<()> {
        let bytes = serialize_rows(rows).map_err(to_cache_error)?;
        let generation = self.generation(type_name).await;
        self.write_slot(rows_key(type_name, generation, fingerprint), bytes)
            .await;
        Ok(())
    }
}
