use async_trait::async_trait;

use crate::query::Row;

use super::{CacheKey, Fingerprint, KeyList, PageResult, Result};

/// The cache collaborator.
///
/// Every slot is namespaced by the entity type name. Object slots hold
/// serialized payloads; query slots hold only keys, so the two are
/// invalidated independently. Query slots (key lists, pages, rows) are
/// expected to become unreachable after [`mark_for_refresh`](Self::mark_for_refresh).
#[async_trait]
pub trait Cache: Send + Sync {
    /// Gets a serialized object slot.
    async fn get(&self, type_name: &str, key: &str) -> Result<Option<Vec<u8>>>;

    /// Sets a serialized object slot.
    async fn set(&self, type_name: &str, key: &str, value: &[u8]) -> Result<()>;

    /// Bulk-gets object slots. Returns the payloads found, in no particular
    /// order; missing slots are skipped.
    async fn get_many(&self, type_name: &str, keys: &[CacheKey]) -> Result<Vec<Vec<u8>>>;

    /// Evicts one object slot.
    async fn remove(&self, type_name: &str, key: &str) -> Result<()>;

    /// Evicts every object slot of a type.
    async fn remove_all(&self, type_name: &str) -> Result<()>;

    /// Marks every query slot of a type stale.
    async fn mark_for_refresh(&self, type_name: &str) -> Result<()>;

    /// Gets the key list cached for a query fingerprint.
    async fn get_key_list(
        &self,
        type_name: &str,
        fingerprint: &Fingerprint,
    ) -> Result<Option<KeyList>>;

    /// Caches the key list of a query fingerprint.
    async fn set_key_list(
        &self,
        type_name: &str,
        fingerprint: &Fingerprint,
        keys: &KeyList,
    ) -> Result<()>;

    /// Gets the paginated key list cached for a criteria fingerprint.
    async fn get_page(
        &self,
        type_name: &str,
        fingerprint: &Fingerprint,
    ) -> Result<Option<PageResult>>;

    /// Caches the paginated key list of a criteria fingerprint.
    async fn set_page(
        &self,
        type_name: &str,
        fingerprint: &Fingerprint,
        page: &PageResult,
    ) -> Result<()>;

    /// Gets raw rows cached for a statement fingerprint.
    async fn get_rows(&self, type_name: &str, fingerprint: &Fingerprint)
        -> Result<Option<Vec<Row>>>;

    /// Caches raw rows for a statement fingerprint.
    async fn set_rows(&self, type_name: &str, fingerprint: &Fingerprint, rows: &[Row])
        -> Result<()>;
}
