//! Cached repository decorator.
//!
//! Wraps a store with the cache-aside pattern:
//!
//! - **Reads**: check the cache first, on miss fetch from the store and
//!   populate the cache
//! - **Writes**: persist to the store, then evict the written object's slot
//!   and mark the type's query slots stale
//!
//! Query results are cached as ordered key lists rather than payloads. A
//! later read resolves the keys through the object cache and replenishes
//! whatever was evicted from the store, so object slots and query slots can
//! be invalidated independently without losing result order.

mod read;
mod reconcile;
mod repository;
mod write;

#[cfg(test)]
mod test_support;

pub use repository::CachedRepository;
