use repocache_core::cache::Cache;
use repocache_core::entity::{Entity, EntityDescriptor, PrimaryKey};
use repocache_core::query::{RawStatement, RefreshCondition};
use repocache_core::storage::Store;

use super::CachedRepository;
use crate::error::Result;

impl<S, C> CachedRepository<S, C>
where
    S: Store,
    C: Cache,
{
    /// Inserts an entity and returns its primary key.
    ///
    /// Evicts any confirmed-absent marker left under the new key and marks
    /// the type's query slots stale. The new object is not cached.
    pub async fn create<T: Entity>(&self, entity: &T) -> Result<PrimaryKey> {
        let store = self.store()?;
        let descriptor = self.descriptor::<T>();
        let id = store.create(entity).await?;

        if let Some(cache) = self.active_cache(&descriptor) {
            cache.remove(descriptor.type_name, &id.to_string()).await?;
            mark_stale(cache, &descriptor).await?;
        }
        tracing::debug!(type_name = descriptor.type_name, %id, "Entity created");
        Ok(id)
    }

    /// Inserts several entities. An empty batch is a no-op returning `false`.
    ///
    /// Evicts the object slot of every entity that already carries a key and
    /// marks the type stale once.
    pub async fn create_batch<T: Entity>(&self, entities: &[T]) -> Result<bool> {
        let store = self.store()?;
        if entities.is_empty() {
            return Ok(false);
        }

        let descriptor = self.descriptor::<T>();
        let created = store.create_batch(entities).await?;

        if let Some(cache) = self.active_cache(&descriptor) {
            // Entities without a key yet cannot have a cached slot.
            for entity in entities {
                evict(cache, &descriptor, entity).await?;
            }
            mark_stale(cache, &descriptor).await?;
        }
        tracing::debug!(
            type_name = descriptor.type_name,
            count = entities.len(),
            created,
            "Entity batch created"
        );
        Ok(created)
    }

    /// Updates an entity by primary key.
    ///
    /// On success, evicts the entity's object slot and marks the type stale.
    pub async fn refresh<T: Entity>(&self, entity: &T) -> Result<bool> {
        let store = self.store()?;
        let descriptor = self.descriptor::<T>();
        let refreshed = store.refresh(entity).await?;

        if refreshed {
            if let Some(cache) = self.active_cache(&descriptor) {
                evict(cache, &descriptor, entity).await?;
                mark_stale(cache, &descriptor).await?;
            }
        }
        tracing::debug!(type_name = descriptor.type_name, refreshed, "Entity refreshed");
        Ok(refreshed)
    }

    /// Applies a conditioned update.
    ///
    /// With a known target only its object slot is evicted; a condition-wide
    /// update evicts every object slot of the type. Either way the type is
    /// marked stale, whatever the store reports.
    pub async fn refresh_by_condition<T: Entity>(
        &self,
        update: &RefreshCondition<T>,
    ) -> Result<bool> {
        let store = self.store()?;
        let descriptor = self.descriptor::<T>();
        let refreshed = store.refresh_by_condition(update).await?;

        if let Some(cache) = self.active_cache(&descriptor) {
            let type_name = descriptor.type_name;
            match update.target.as_ref().and_then(|t| descriptor.cache_key(t)) {
                Some(key) => cache.remove(type_name, &key).await?,
                None => {
                    cache.remove_all(type_name).await?;
                    tracing::debug!(type_name, "Evicted all cached objects");
                }
            }
            mark_stale(cache, &descriptor).await?;
        }
        tracing::debug!(type_name = descriptor.type_name, refreshed, "Conditioned refresh applied");
        Ok(refreshed)
    }

    /// Deletes an entity by primary key.
    ///
    /// Evicts its object slot and marks the type stale, whatever the store
    /// reports.
    pub async fn remove<T: Entity>(&self, entity: &T) -> Result<bool> {
        let store = self.store()?;
        let descriptor = self.descriptor::<T>();
        let key = descriptor.cache_key(entity);
        let removed = store.remove(entity).await?;

        if let Some(cache) = self.active_cache(&descriptor) {
            if let Some(key) = &key {
                cache.remove(descriptor.type_name, key).await?;
            }
            mark_stale(cache, &descriptor).await?;
        }
        tracing::debug!(type_name = descriptor.type_name, key = ?key, removed, "Entity removed");
        Ok(removed)
    }

    /// Executes a raw statement on behalf of an entity.
    ///
    /// On success only the entity's own object slot is evicted; query slots
    /// are left alone.
    pub async fn execute<T: Entity>(&self, entity: &T, statement: &RawStatement) -> Result<bool> {
        let store = self.store()?;
        let descriptor = self.descriptor::<T>();
        let executed = store.execute(entity, statement).await?;

        if executed {
            if let Some(cache) = self.active_cache(&descriptor) {
                evict(cache, &descriptor, entity).await?;
            }
        }
        tracing::debug!(type_name = descriptor.type_name, executed, "Raw statement executed");
        Ok(executed)
    }

    /// Marks every cached query of `T` stale.
    ///
    /// For callers that changed the system of record behind the repository's
    /// back.
    pub async fn refresh_cache<T: Entity>(&self) -> Result<()> {
        self.store()?;
        let descriptor = self.descriptor::<T>();
        if let Some(cache) = self.active_cache(&descriptor) {
            mark_stale(cache, &descriptor).await?;
        }
        Ok(())
    }
}

async fn evict<C: Cache, T>(cache: &C, descriptor: &EntityDescriptor<T>, entity: &T) -> Result<()> {
    if let Some(key) = descriptor.cache_key(entity) {
        cache.remove(descriptor.type_name, &key).await?;
        tracing::trace!(type_name = descriptor.type_name, %key, "Evicted cached object");
    }
    Ok(())
}

async fn mark_stale<C: Cache, T>(cache: &C, descriptor: &EntityDescriptor<T>) -> Result<()> {
    cache.mark_for_refresh(descriptor.type_name).await?;
    tracing::trace!(type_name = descriptor.type_name, "Marked type for refresh");
    Ok(())
}
