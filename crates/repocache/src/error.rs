use thiserror::Error;

use repocache_core::cache::{CacheError, SerializationError};
use repocache_core::storage::StoreError;

/// Errors returned by [`CachedRepository`](crate::storage::cached::CachedRepository).
///
/// Store and cache failures pass through unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// No store is bound; nothing was attempted.
    #[error("Repository is not configured: no store bound")]
    NotConfigured,
    /// A binding was set twice.
    #[error("Repository {0} binding is already configured")]
    AlreadyConfigured(&'static str),
    /// The caller passed a query shape the operation does not accept.
    #[error("Invalid usage: {0}")]
    Usage(String),
    #[error(transparent)]
    Serialization(#[from] SerializationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
