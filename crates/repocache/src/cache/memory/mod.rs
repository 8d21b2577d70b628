//! In-memory cache backend implementation.
//!
//! Provides a thread-safe, LRU-bounded cache for single-instance deployments
//! and tests.

mod cache;

pub use cache::MemoryCache;
