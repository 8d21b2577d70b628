use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use super::{Entity, EntityDescriptor};

type Descriptors = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

/// Registry of entity descriptors, one per type.
///
/// Descriptors are computed on first use and cached for the lifetime of the
/// catalog. Types named through [`with_no_cache_types`](Self::with_no_cache_types)
/// are forced to bypass the cache regardless of their own descriptor.
#[derive(Debug, Default)]
pub struct MetadataCatalog {
    descriptors: RwLock<Descriptors>,
    no_cache_types: HashSet<String>,
}

impl MetadataCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces the no-cache flag for the named types.
    pub fn with_no_cache_types<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.no_cache_types.extend(names.into_iter().map(Into::into));
        self
    }

    /// Registers a descriptor explicitly, replacing any cached one.
    pub fn register<T: Entity>(&self, descriptor: EntityDescriptor<T>) -> Arc<EntityDescriptor<T>> {
        let descriptor = Arc::new(self.apply_overrides(descriptor));
        let mut descriptors = self
            .descriptors
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        descriptors.insert(TypeId::of::<T>(), descriptor.clone());
        descriptor
    }

    /// Returns the descriptor of `T`, computing and caching it on first use.
    pub fn resolve<T: Entity>(&self) -> Arc<EntityDescriptor<T>> {
        {
            let descriptors = self
                .descriptors
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(found) = descriptors.get(&TypeId::of::<T>()) {
                if let Ok(descriptor) = found.clone().downcast::<EntityDescriptor<T>>() {
                    return descriptor;
                }
            }
        }
        self.register(T::descriptor())
    }

    fn apply_overrides<T>(&self, descriptor: EntityDescriptor<T>) -> EntityDescriptor<T> {
        if self.no_cache_types.contains(descriptor.type_name) {
            descriptor.with_no_cache(true)
        } else {
            descriptor
        }
    }
}
