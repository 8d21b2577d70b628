//! Cache-aside repository decorator.
//!
//! [`CachedRepository`] sits between callers and a
//! [`Store`](repocache_core::storage::Store), checking a
//! [`Cache`](repocache_core::cache::Cache) before every read and invalidating
//! it after every write. Query results are cached as ordered key lists, so
//! evicting one object never forces a whole query to be re-run and a partially
//! evicted result still comes back in its original order.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use repocache::cache::MemoryCache;
//! use repocache::storage::{CachedRepository, InMemoryStore};
//! use repocache::Config;
//! use repocache_core::query::Condition;
//!
//! let config = Config::from_env();
//! let repo = CachedRepository::from_config(&config);
//! repo.bind_store(Arc::new(InMemoryStore::new(repo.catalog().clone())))?;
//! repo.bind_cache(Arc::new(MemoryCache::new(config.cache_max_entries)))?;
//!
//! repo.create(&order).await?;
//! let open = repo.list(Condition::Example(Order::with_status("open"))).await?;
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod storage;

#[cfg(test)]
mod fixtures;

pub use config::Config;
pub use error::{RepositoryError, Result};
pub use storage::CachedRepository;
