//! In-memory storage backend.
//!
//! Stores every entity type as a table of JSON rows keyed by primary key,
//! wrapped in `Arc<RwLock<_>>`. Useful for tests and for development where
//! persistence is not required.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use repocache::storage::inmemory::InMemoryStore;
//! use repocache_core::entity::MetadataCatalog;
//!
//! let store = InMemoryStore::new(Arc::new(MetadataCatalog::new()));
//! ```

mod matching;
mod store;

pub use store::InMemoryStore;
