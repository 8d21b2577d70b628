//! Cache backend implementations.
//!
//! This module provides concrete implementations of the cache trait
//! defined in `repocache_core::cache`, selected via feature flags.
//!
//! # Feature Flags
//!
//! - `memory` (default): In-memory LRU cache using tokio synchronization primitives

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "memory")]
pub use memory::MemoryCache;
