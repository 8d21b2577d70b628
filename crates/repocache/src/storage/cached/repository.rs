use std::sync::{Arc, OnceLock};

use repocache_core::cache::Cache;
use repocache_core::entity::{Entity, EntityDescriptor, MetadataCatalog};
use repocache_core::storage::Store;

use crate::config::Config;
use crate::error::{RepositoryError, Result};

/// Caching repository decorator.
///
/// Implements cache-aside reads and write-through invalidation on top of a
/// store:
/// - **Reads**: single objects are cached by key; query results are cached as
///   ordered key lists and resolved through the object cache
/// - **Writes**: persist to the store, evict the written object's slot, mark
///   the type's query slots stale
///
/// Bindings are set once before first use. Only the store is mandatory:
/// without a cache, or for types flagged no-cache, every operation is a plain
/// passthrough to the store.
///
/// # Type Parameters
///
/// * `S` - The store holding the system of record
/// * `C` - The cache implementation
pub struct CachedRepository<S, C> {
    catalog: Arc<MetadataCatalog>,
    store: OnceLock<Arc<S>>,
    cache: OnceLock<Arc<C>>,
    cache_disabled: bool,
}

impl<S, C> CachedRepository<S, C>
where
    S: Store,
    C: Cache,
{
    /// Creates an unbound repository resolving entity metadata from `catalog`.
    pub fn new(catalog: Arc<MetadataCatalog>) -> Self {
        Self {
            catalog,
            store: OnceLock::new(),
            cache: OnceLock::new(),
            cache_disabled: false,
        }
    }

    /// Creates an unbound repository from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::new(config.catalog())).with_cache_disabled(config.cache_disabled)
    }

    /// Sets the global no-cache switch.
    pub fn with_cache_disabled(mut self, disabled: bool) -> Self {
        self.cache_disabled = disabled;
        self
    }

    /// Binds the store. Fails if a store is already bound.
    pub fn bind_store(&self, store: Arc<S>) -> Result<()> {
        self.store
            .set(store)
            .map_err(|_| RepositoryError::AlreadyConfigured("store"))
    }

    /// Binds the cache. Fails if a cache is already bound.
    pub fn bind_cache(&self, cache: Arc<C>) -> Result<()> {
        self.cache
            .set(cache)
            .map_err(|_| RepositoryError::AlreadyConfigured("cache"))
    }

    /// Returns the metadata catalog.
    pub fn catalog(&self) -> &Arc<MetadataCatalog> {
        &self.catalog
    }

    /// Returns true when the global no-cache switch is on.
    pub fn is_cache_disabled(&self) -> bool {
        self.cache_disabled
    }

    /// The bound store, or [`RepositoryError::NotConfigured`].
    ///
    /// Every public operation calls this before anything else.
    pub(super) fn store(&self) -> Result<&S> {
        self.store
            .get()
            .map(Arc::as_ref)
            .ok_or(RepositoryError::NotConfigured)
    }

    pub(super) fn descriptor<T: Entity>(&self) -> Arc<EntityDescriptor<T>> {
        self.catalog.resolve::<T>()
    }

    /// The cache to use for `T`, or `None` when reads and writes of `T` must
    /// bypass caching.
    pub(super) fn active_cache<T>(&self, descriptor: &EntityDescriptor<T>) -> Option<&C> {
        if self.cache_disabled || descriptor.no_cache {
            return None;
        }
        self.cache.get().map(Arc::as_ref)
    }
}
