//! Pure key-list functions used by query caching.
//!
//! A key list is the ordered identity of a query result. It carries no
//! payloads: the objects themselves live in per-object slots.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::entity::EntityDescriptor;
use crate::query::Page;

/// String form of an entity's primary key.
pub type CacheKey = String;

/// Ordered sequence of cache keys identifying a query result.
pub type KeyList = Vec<CacheKey>;

/// A cached page: its key list plus pagination counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    pub offset: u64,
    pub size: u64,
    pub total: u64,
    pub keys: KeyList,
}

impl PageResult {
    /// Captures the counters of a page together with its key list.
    pub fn from_page<T>(page: &Page<T>, keys: KeyList) -> Self {
        Self {
            offset: page.offset,
            size: page.size,
            total: page.total,
            keys,
        }
    }

    /// Rebuilds a page from the counters and resolved items.
    pub fn into_page<T>(self, items: Vec<T>) -> Page<T> {
        Page::new(self.offset, self.size, self.total, items)
    }
}

/// Derives the key list of a store result, preserving its order.
///
/// Entities whose key cannot be derived are left out; the failure has
/// already been logged by the descriptor.
pub fn derive_key_list<T>(descriptor: &EntityDescriptor<T>, entities: &[T]) -> KeyList {
    entities
        .iter()
        .filter_map(|entity| descriptor.cache_key(entity))
        .collect()
}

/// Orders `entities` by `keys`.
///
/// Each key takes the next entity whose own primary key equals it. Keys with
/// no matching entity are skipped, and entities matching no key are dropped,
/// so the output never exceeds the key list and always follows its order.
pub fn sort_by_key_list<T>(
    descriptor: &EntityDescriptor<T>,
    keys: &[CacheKey],
    entities: Vec<T>,
) -> Vec<T> {
    let mut pool: HashMap<CacheKey, VecDeque<T>> = HashMap::with_capacity(entities.len());
    for entity in entities {
        if let Some(key) = descriptor.cache_key(&entity) {
            pool.entry(key).or_default().push_back(entity);
        }
    }

    let mut sorted = Vec::with_capacity(keys.len());
    for key in keys {
        if let Some(entity) = pool.get_mut(key).and_then(VecDeque::pop_front) {
            sorted.push(entity);
        }
    }
    sorted
}
