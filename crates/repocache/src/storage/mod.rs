//! Storage layer: the caching repository and the reference store backend.
//!
//! [`cached::CachedRepository`] is the entry point. It decorates any
//! [`Store`](repocache_core::storage::Store) with any
//! [`Cache`](repocache_core::cache::Cache).
//!
//! # Feature Flags
//!
//! - `inmemory` (default): [`inmemory::InMemoryStore`], a table-per-type store
//!   held in memory

pub mod cached;

#[cfg(feature = "inmemory")]
pub mod inmemory;

pub use cached::CachedRepository;

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryStore;
