use serde_json::Value;

use repocache_core::cache::{
    derive_key_list, deserialize_slot, serialize_slot, Cache, Fingerprint, KeyList, PageResult,
};
use repocache_core::entity::{Entity, PrimaryKey};
use repocache_core::query::{
    Condition, Criteria, Direction, Page, RawStatement, ReduceCondition, Row,
};
use repocache_core::storage::Store;

use super::reconcile::resolve_keys;
use super::CachedRepository;
use crate::error::{RepositoryError, Result};

impl<S, C> CachedRepository<S, C>
where
    S: Store,
    C: Cache,
{
    /// Gets an entity by primary key.
    ///
    /// The outcome is cached either way: a confirmed absence is remembered
    /// until the slot is evicted.
    pub async fn get<T: Entity>(&self, id: &PrimaryKey) -> Result<Option<T>> {
        let store = self.store()?;
        let descriptor = self.descriptor::<T>();
        let Some(cache) = self.active_cache(&descriptor) else {
            return Ok(store.get(id).await?);
        };

        let type_name = descriptor.type_name;
        let key = id.to_string();

        if let Some(bytes) = cache.get(type_name, &key).await? {
            match deserialize_slot::<T>(&bytes) {
                Ok(entity) => {
                    tracing::trace!(
                        type_name,
                        %key,
                        found = entity.is_some(),
                        "Cache hit for object"
                    );
                    return Ok(entity);
                }
                // Deserialization failed - treat as cache miss
                Err(err) => {
                    tracing::warn!(
                        type_name,
                        %key,
                        error = %err,
                        "Cached object deserialization failed"
                    )
                }
            }
        }

        tracing::trace!(type_name, %key, "Cache miss for object");
        let entity = store.get::<T>(id).await?;
        cache
            .set(type_name, &key, &serialize_slot(entity.as_ref())?)
            .await?;
        Ok(entity)
    }

    /// Gets the first entity matching a plain condition.
    ///
    /// Only [`Condition::Example`] is accepted; anything else is a usage error.
    pub async fn get_one<T: Entity>(&self, condition: Condition<T>) -> Result<Option<T>> {
        self.first_match(condition, None).await
    }

    /// Gets the first entity matching a plain condition under an ordering.
    pub async fn get_one_ordered<T: Entity>(
        &self,
        condition: Condition<T>,
        order_by: &str,
        direction: Direction,
    ) -> Result<Option<T>> {
        self.first_match(condition, Some((order_by, direction)))
            .await
    }

    /// Single-result lookups cache a key list of at most one key, so the
    /// object itself is read through the object cache like any list result.
    async fn first_match<T: Entity>(
        &self,
        condition: Condition<T>,
        order: Option<(&str, Direction)>,
    ) -> Result<Option<T>> {
        let store = self.store()?;
        let example = match condition {
            Condition::Example(example) => example,
            other => {
                return Err(RepositoryError::Usage(format!(
                    "get_one requires a plain condition, got {}",
                    other.kind()
                )))
            }
        };

        let descriptor = self.descriptor::<T>();
        let Some(cache) = self.active_cache(&descriptor) else {
            return load_first(store, &example, order).await;
        };

        let type_name = descriptor.type_name;
        let fingerprint = Fingerprint::one(&example, order)?;

        if let Some(keys) = cache.get_key_list(type_name, &fingerprint).await? {
            tracing::trace!(
                type_name,
                %fingerprint,
                found = !keys.is_empty(),
                "Cache hit for single result"
            );
            if keys.is_empty() {
                return Ok(None);
            }
            let resolved = resolve_keys(store, cache, &descriptor, &keys).await?;
            return Ok(resolved.into_iter().next());
        }

        tracing::trace!(type_name, %fingerprint, "Cache miss for single result");
        let entity = load_first(store, &example, order).await?;
        match &entity {
            Some(found) => {
                if let Some(key) = descriptor.cache_key(found) {
                    cache
                        .set(type_name, &key, &serialize_slot(Some(found))?)
                        .await?;
                    cache
                        .set_key_list(type_name, &fingerprint, &vec![key])
                        .await?;
                }
            }
            None => {
                cache
                    .set_key_list(type_name, &fingerprint, &KeyList::new())
                    .await?
            }
        }
        Ok(entity)
    }

    /// Lists the entities matching a condition, in store order.
    ///
    /// Results are cached as a key list under the condition's fingerprint.
    /// IN conditions are normalized first and short-circuit to an empty list
    /// when no value survives. Raw statements are rejected; use
    /// [`list_rows`](Self::list_rows).
    pub async fn list<T: Entity>(&self, condition: Condition<T>) -> Result<Vec<T>> {
        let store = self.store()?;
        let condition = match condition {
            Condition::Raw(_) => {
                return Err(RepositoryError::Usage(
                    "list requires a typed condition, use list_rows for raw statements"
                        .to_string(),
                ))
            }
            Condition::In(in_condition) => match in_condition.normalized() {
                Some(normalized) => Condition::In(normalized),
                None => {
                    tracing::trace!("IN condition has no values, skipping query");
                    return Ok(Vec::new());
                }
            },
            other => other,
        };

        let descriptor = self.descriptor::<T>();
        let Some(cache) = self.active_cache(&descriptor) else {
            return load(store, &condition).await;
        };

        let type_name = descriptor.type_name;
        let fingerprint = condition.fingerprint()?;

        if let Some(keys) = cache.get_key_list(type_name, &fingerprint).await? {
            if !keys.is_empty() {
                tracing::trace!(
                    type_name,
                    %fingerprint,
                    count = keys.len(),
                    "Cache hit for key list"
                );
                return resolve_keys(store, cache, &descriptor, &keys).await;
            }
        }

        tracing::trace!(type_name, %fingerprint, "Cache miss for key list");
        let entities = load(store, &condition).await?;
        cache
            .set_key_list(type_name, &fingerprint, &derive_key_list(&descriptor, &entities))
            .await?;
        Ok(entities)
    }

    /// Runs a paginated query.
    ///
    /// The page is cached as its key list plus counters. A cached page with
    /// no keys is treated as a miss.
    pub async fn find<T: Entity>(&self, criteria: &Criteria) -> Result<Page<T>> {
        let store = self.store()?;
        let descriptor = self.descriptor::<T>();
        let Some(cache) = self.active_cache(&descriptor) else {
            return Ok(store.find(criteria).await?);
        };

        let type_name = descriptor.type_name;
        let fingerprint = Fingerprint::criteria(criteria)?;

        if let Some(cached) = cache.get_page(type_name, &fingerprint).await? {
            if !cached.keys.is_empty() {
                tracing::trace!(
                    type_name,
                    %fingerprint,
                    total = cached.total,
                    "Cache hit for page"
                );
                let items = resolve_keys(store, cache, &descriptor, &cached.keys).await?;
                return Ok(cached.into_page(items));
            }
        }

        tracing::trace!(type_name, %fingerprint, "Cache miss for page");
        let page = store.find::<T>(criteria).await?;
        let keys = derive_key_list(&descriptor, &page.items);
        cache
            .set_page(type_name, &fingerprint, &PageResult::from_page(&page, keys))
            .await?;
        Ok(page)
    }

    /// Runs a raw statement returning loosely typed rows, cached under the
    /// statement's fingerprint until `T` is next marked stale.
    pub async fn list_rows<T: Entity>(&self, statement: &RawStatement) -> Result<Vec<Row>> {
        let store = self.store()?;
        let descriptor = self.descriptor::<T>();
        let Some(cache) = self.active_cache(&descriptor) else {
            return Ok(store.list_rows::<T>(statement).await?);
        };

        let type_name = descriptor.type_name;
        let fingerprint = Fingerprint::raw(statement);

        if let Some(rows) = cache.get_rows(type_name, &fingerprint).await? {
            tracing::trace!(type_name, %fingerprint, count = rows.len(), "Cache hit for rows");
            return Ok(rows);
        }

        tracing::trace!(type_name, %fingerprint, "Cache miss for rows");
        let rows = store.list_rows::<T>(statement).await?;
        cache.set_rows(type_name, &fingerprint, &rows).await?;
        Ok(rows)
    }

    /// Paginated result-mapped read. Never cached.
    pub async fn find_rows<T: Entity>(&self, criteria: &Criteria) -> Result<Page<Row>> {
        Ok(self.store()?.find_rows::<T>(criteria).await?)
    }

    /// Result-mapped read. Never cached.
    pub async fn list_rows_by_criteria<T: Entity>(&self, criteria: &Criteria) -> Result<Vec<Row>> {
        Ok(self.store()?.list_rows_by_criteria::<T>(criteria).await?)
    }

    /// Aggregate over the type. Never cached.
    pub async fn reduce<T: Entity>(&self, condition: &ReduceCondition) -> Result<Value> {
        Ok(self.store()?.reduce::<T>(condition).await?)
    }
}

/// Runs a condition against the store.
async fn load<S: Store, T: Entity>(store: &S, condition: &Condition<T>) -> Result<Vec<T>> {
    let entities = match condition {
        Condition::Example(example) => store.list(example).await?,
        Condition::Criteria(criteria) => store.list_by_criteria(criteria).await?,
        Condition::All => store.list_all().await?,
        Condition::In(in_condition) => store.list_in(in_condition).await?,
        Condition::Raw(_) => {
            return Err(RepositoryError::Usage(
                "raw statements do not produce entities".to_string(),
            ))
        }
    };
    Ok(entities)
}

/// Loads the first match of an example, ordered when asked to.
async fn load_first<S: Store, T: Entity>(
    store: &S,
    example: &T,
    order: Option<(&str, Direction)>,
) -> Result<Option<T>> {
    let entity = match order {
        Some((order_by, direction)) => store.get_one(example, order_by, direction).await?,
        None => store.list(example).await?.into_iter().next(),
    };
    Ok(entity)
}
