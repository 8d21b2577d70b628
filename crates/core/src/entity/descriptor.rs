use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{KeyKind, PrimaryKey};
use crate::cache::CacheKey;

/// An application type whose instances can be stored and cached.
///
/// `Default` is the zero-value constructor used to build key probes.
pub trait Entity: Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Describes the type's primary key and caching policy.
    ///
    /// Called once per type by [`MetadataCatalog`](super::MetadataCatalog).
    fn descriptor() -> EntityDescriptor<Self>;
}

/// Per-type metadata: primary-key accessor/mutator and the no-cache flag.
pub struct EntityDescriptor<T> {
    /// Namespace of the type in the cache and in stores.
    pub type_name: &'static str,
    /// Name of the primary-key field in the serialized form.
    pub key_field: &'static str,
    pub key_kind: KeyKind,
    /// When set, every operation on the type bypasses the cache.
    pub no_cache: bool,
    key: fn(&T) -> Option<PrimaryKey>,
    set_key: fn(&mut T, PrimaryKey),
}

impl<T> EntityDescriptor<T> {
    /// Creates a descriptor with caching enabled.
    ///
    /// `key` returns `None` when the key cannot be read (for example an
    /// unset optional field).
    pub fn new(
        type_name: &'static str,
        key_field: &'static str,
        key_kind: KeyKind,
        key: fn(&T) -> Option<PrimaryKey>,
        set_key: fn(&mut T, PrimaryKey),
    ) -> Self {
        Self {
            type_name,
            key_field,
            key_kind,
            no_cache: false,
            key,
            set_key,
        }
    }

    /// Sets the no-cache flag.
    pub fn with_no_cache(mut self, no_cache: bool) -> Self {
        self.no_cache = no_cache;
        self
    }

    /// Reads the typed primary key of an instance.
    pub fn primary_key(&self, entity: &T) -> Option<PrimaryKey> {
        (self.key)(entity)
    }

    /// Writes the primary key of an instance.
    pub fn set_primary_key(&self, entity: &mut T, key: PrimaryKey) {
        (self.set_key)(entity, key)
    }

    /// Derives the cache key of an instance from its own primary-key field.
    ///
    /// A failure is logged and yields `None`; callers treat it as a key that
    /// matches nothing.
    pub fn cache_key(&self, entity: &T) -> Option<CacheKey> {
        match (self.key)(entity) {
            Some(key) => Some(key.to_string()),
            None => {
                tracing::warn!(
                    type_name = self.type_name,
                    key_field = self.key_field,
                    "Failed to derive cache key"
                );
                None
            }
        }
    }
}

impl<T: Default> EntityDescriptor<T> {
    /// Builds a zero-value instance whose only populated field is the
    /// primary key parsed from `key`.
    pub fn probe(&self, key: &str) -> Option<T> {
        let key = PrimaryKey::parse(self.key_kind, key)?;
        let mut probe = T::default();
        (self.set_key)(&mut probe, key);
        Some(probe)
    }
}

impl<T> Clone for EntityDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            type_name: self.type_name,
            key_field: self.key_field,
            key_kind: self.key_kind,
            no_cache: self.no_cache,
            key: self.key,
            set_key: self.set_key,
        }
    }
}

impl<T> fmt::Debug for EntityDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("type_name", &self.type_name)
            .field("key_field", &self.key_field)
            .field("key_kind", &self.key_kind)
            .field("no_cache", &self.no_cache)
            .finish()
    }
}
