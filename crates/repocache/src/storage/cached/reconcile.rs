//! Key-list reconciliation.
//!
//! A cached key list only names a query's results. Resolving it goes through
//! the object cache first; keys whose object slot was evicted are reloaded
//! from the store one by one. A key the store no longer knows means the list
//! is stale, so the whole type is marked for refresh rather than patching
//! this one list. The output always follows key-list order.

use std::collections::HashSet;

use repocache_core::cache::{
    deserialize_slot, serialize_slot, sort_by_key_list, Cache, CacheKey,
};
use repocache_core::entity::{Entity, EntityDescriptor, KeyKind, PrimaryKey};
use repocache_core::storage::Store;

use crate::error::Result;

/// Resolves a cached key list into entities, in key-list order.
pub(super) async fn resolve_keys<S, C, T>(
    store: &S,
    cache: &C,
    descriptor: &EntityDescriptor<T>,
    keys: &[CacheKey],
) -> Result<Vec<T>>
where
    S: Store,
    C: Cache,
    T: Entity,
{
    let type_name = descriptor.type_name;
    let mut resolved: Vec<T> = cache
        .get_many(type_name, keys)
        .await?
        .iter()
        .filter_map(|bytes| decode_cached(type_name, bytes))
        .collect();

    if resolved.len() == keys.len() {
        tracing::trace!(type_name, count = keys.len(), "Key list resolved from cache");
    } else {
        tracing::trace!(
            type_name,
            expected = keys.len(),
            cached = resolved.len(),
            "Key list partially cached, replenishing"
        );
        replenish(store, cache, descriptor, keys, &mut resolved).await?;
    }

    // Bulk gets make no ordering promise, even on a full hit.
    Ok(sort_by_key_list(descriptor, keys, resolved))
}

/// Decodes an object slot. Confirmed-absent markers and corrupt payloads
/// both resolve to nothing.
fn decode_cached<T: Entity>(type_name: &str, bytes: &[u8]) -> Option<T> {
    match deserialize_slot::<T>(bytes) {
        Ok(entity) => entity,
        Err(err) => {
            tracing::warn!(type_name, error = %err, "Cached object deserialization failed");
            None
        }
    }
}

/// Loads every key missing from `resolved` and re-caches what the store
/// still has. Marks the type stale if any key has vanished.
async fn replenish<S, C, T>(
    store: &S,
    cache: &C,
    descriptor: &EntityDescriptor<T>,
    keys: &[CacheKey],
    resolved: &mut Vec<T>,
) -> Result<()>
where
    S: Store,
    C: Cache,
    T: Entity,
{
    let type_name = descriptor.type_name;
    let mut present: HashSet<CacheKey> = resolved
        .iter()
        .filter_map(|entity| descriptor.cache_key(entity))
        .collect();
    let mut vanished = 0usize;

    for key in keys {
        if !present.insert(key.clone()) {
            continue;
        }
        match load_by_key(store, descriptor, key).await? {
            Some(entity) => {
                cache
                    .set(type_name, key, &serialize_slot(Some(&entity))?)
                    .await?;
                resolved.push(entity);
            }
            None => {
                tracing::warn!(type_name, %key, "Cached key no longer exists in the store");
                vanished += 1;
            }
        }
    }

    if vanished > 0 {
        cache.mark_for_refresh(type_name).await?;
        tracing::debug!(type_name, vanished, "Marked type for refresh");
    }
    Ok(())
}

/// Loads one entity by its cache key.
///
/// Text keys are looked up by example with only the key field set; integral
/// keys go through a direct get.
async fn load_by_key<S, T>(
    store: &S,
    descriptor: &EntityDescriptor<T>,
    key: &str,
) -> Result<Option<T>>
where
    S: Store,
    T: Entity,
{
    match descriptor.key_kind {
        KeyKind::Text => {
            // An empty probe would match every row.
            let Some(probe) = descriptor.probe(key).filter(|_| !key.is_empty()) else {
                return Ok(None);
            };
            Ok(store.list(&probe).await?.into_iter().next())
        }
        KeyKind::Integral => match PrimaryKey::parse(KeyKind::Integral, key) {
            Some(id) => Ok(store.get(&id).await?),
            None => {
                tracing::warn!(
                    type_name = descriptor.type_name,
                    %key,
                    "Cached key is not a valid integral key"
                );
                Ok(None)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{Order, Sku};
    use crate::storage::cached::test_support::{count, ids, Harness};
    use repocache_core::cache::Fingerprint;
    use repocache_core::query::Condition;

    fn keys(raw: &[&str]) -> Vec<CacheKey> {
        raw.iter().map(|k| k.to_string()).collect()
    }

    async fn cache_order(harness: &Harness, order: &Order) {
        harness
            .cache
            .inner()
            .set("Order", &order.id.to_string(), &serialize_slot(Some(order)).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_full_hit_uses_no_store() {
        let harness = Harness::new();
        let descriptor = harness.repo.descriptor::<Order>();
        for id in [1, 2, 3] {
            cache_order(&harness, &Order::new(id, "open", 10)).await;
        }

        let orders = resolve_keys(
            harness.store.as_ref(),
            harness.cache.as_ref(),
            &descriptor,
            &keys(&["3", "1", "2"]),
        )
        .await
        .unwrap();

        assert_eq!(ids(&orders), vec![3, 1, 2]);
        assert_eq!(count(&harness.store.calls), 0);
    }

    #[tokio::test]
    async fn test_full_hit_is_sorted_defensively() {
        let harness = Harness::new();
        let descriptor = harness.repo.descriptor::<Order>();
        for id in [1, 2, 3] {
            cache_order(&harness, &Order::new(id, "open", 10)).await;
        }
        harness.cache.reverse_bulk_order();

        let orders = resolve_keys(
            harness.store.as_ref(),
            harness.cache.as_ref(),
            &descriptor,
            &keys(&["1", "2", "3"]),
        )
        .await
        .unwrap();

        assert_eq!(ids(&orders), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_partial_hit_preserves_order() {
        let harness = Harness::new();
        harness.seed_orders(&[1, 2, 3]).await;
        let descriptor = harness.repo.descriptor::<Order>();
        cache_order(&harness, &Order::new(1, "open", 10)).await;
        cache_order(&harness, &Order::new(3, "open", 30)).await;

        let orders = resolve_keys(
            harness.store.as_ref(),
            harness.cache.as_ref(),
            &descriptor,
            &keys(&["1", "2", "3"]),
        )
        .await
        .unwrap();

        assert_eq!(ids(&orders), vec![1, 2, 3]);
        assert_eq!(count(&harness.store.gets), 1);
        assert_eq!(count(&harness.cache.marks), 0);

        // The replenished object is cached again under its key.
        let cached = harness.cache.inner().get("Order", "2").await.unwrap();
        assert!(cached.is_some());
    }

    #[tokio::test]
    async fn test_vanished_key_marks_type_stale() {
        let harness = Harness::new();
        harness.seed_orders(&[1]).await;
        let descriptor = harness.repo.descriptor::<Order>();
        cache_order(&harness, &Order::new(1, "open", 10)).await;
        let generation = harness.cache.inner().generation("Order").await;

        let orders = resolve_keys(
            harness.store.as_ref(),
            harness.cache.as_ref(),
            &descriptor,
            &keys(&["1", "2"]),
        )
        .await
        .unwrap();

        assert_eq!(ids(&orders), vec![1]);
        assert_eq!(count(&harness.cache.marks), 1);
        assert!(harness.cache.inner().generation("Order").await > generation);
    }

    #[tokio::test]
    async fn test_several_vanished_keys_mark_once() {
        let harness = Harness::new();
        let descriptor = harness.repo.descriptor::<Order>();

        let orders = resolve_keys(
            harness.store.as_ref(),
            harness.cache.as_ref(),
            &descriptor,
            &keys(&["7", "8", "9"]),
        )
        .await
        .unwrap();

        assert!(orders.is_empty());
        assert_eq!(count(&harness.store.gets), 3);
        assert_eq!(count(&harness.cache.marks), 1);
    }

    #[tokio::test]
    async fn test_unparsable_integral_key_is_treated_as_vanished() {
        let harness = Harness::new();
        harness.seed_orders(&[1]).await;
        let descriptor = harness.repo.descriptor::<Order>();

        let orders = resolve_keys(
            harness.store.as_ref(),
            harness.cache.as_ref(),
            &descriptor,
            &keys(&["1", "not-a-number"]),
        )
        .await
        .unwrap();

        assert_eq!(ids(&orders), vec![1]);
        assert_eq!(count(&harness.store.gets), 1);
        assert_eq!(count(&harness.cache.marks), 1);
    }

    #[tokio::test]
    async fn test_text_keys_are_replenished_by_example() {
        let harness = Harness::new();
        for sku in [Sku::new("a-1", "anchor", 1), Sku::new("b-2", "bolt", 2)] {
            harness.store.inner().create(&sku).await.unwrap();
        }
        let descriptor = harness.repo.descriptor::<Sku>();

        let skus = resolve_keys(
            harness.store.as_ref(),
            harness.cache.as_ref(),
            &descriptor,
            &keys(&["b-2", "a-1"]),
        )
        .await
        .unwrap();

        let codes: Vec<&str> = skus.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["b-2", "a-1"]);
        assert_eq!(count(&harness.store.lists), 2);
        assert_eq!(count(&harness.store.gets), 0);
    }

    #[tokio::test]
    async fn test_corrupt_object_slot_is_replenished() {
        let harness = Harness::new();
        harness.seed_orders(&[1]).await;
        let descriptor = harness.repo.descriptor::<Order>();
        harness
            .cache
            .inner()
            .set("Order", "1", b"{not json")
            .await
            .unwrap();

        let orders = resolve_keys(
            harness.store.as_ref(),
            harness.cache.as_ref(),
            &descriptor,
            &keys(&["1"]),
        )
        .await
        .unwrap();

        assert_eq!(ids(&orders), vec![1]);
        assert_eq!(count(&harness.store.gets), 1);
    }

    #[tokio::test]
    async fn test_end_to_end_vanished_order() {
        let harness = Harness::new();
        harness.seed_orders(&[1, 2, 3]).await;
        let status_filter = || Condition::Example(Order::with_status("open"));

        let first = harness.repo.list(status_filter()).await.unwrap();
        assert_eq!(ids(&first), vec![1, 2, 3]);
        let fingerprint = status_filter().fingerprint().unwrap();
        let cached = harness
            .cache
            .inner()
            .get_key_list("Order", &fingerprint)
            .await
            .unwrap();
        assert_eq!(cached, Some(keys(&["1", "2", "3"])));

        harness.delete_out_of_band(2).await;

        let second = harness.repo.list(status_filter()).await.unwrap();
        assert_eq!(ids(&second), vec![1, 3]);
        assert_eq!(count(&harness.cache.marks), 1);
        assert_eq!(count(&harness.store.lists), 1);

        // The stale key list is gone; the next read re-derives it.
        let third = harness.repo.list(status_filter()).await.unwrap();
        assert_eq!(ids(&third), vec![1, 3]);
        assert_eq!(count(&harness.store.lists), 2);
    }

    #[tokio::test]
    async fn test_key_list_fingerprint_is_shared_across_calls() {
        let harness = Harness::new();
        harness.seed_orders(&[1, 2]).await;
        let all = Fingerprint::all();

        harness.repo.list::<Order>(Condition::All).await.unwrap();
        let cached = harness
            .cache
            .inner()
            .get_key_list("Order", &all)
            .await
            .unwrap();
        assert_eq!(cached, Some(keys(&["1", "2"])));
    }
}
