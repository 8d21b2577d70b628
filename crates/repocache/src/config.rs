use std::env;

use repocache_core::entity::MetadataCatalog;

/// Repository configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Global no-cache switch: every operation goes straight to the store.
    pub cache_disabled: bool,
    /// Type names that bypass the cache.
    pub no_cache_types: Vec<String>,
    /// Maximum number of cache entries (default: 10,000)
    pub cache_max_entries: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `REPOCACHE_CACHE_DISABLED` - Disable caching entirely (default: false)
    /// - `REPOCACHE_NO_CACHE_TYPES` - Comma-separated type names to never cache (default: none)
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 10,000)
    pub fn from_env() -> Self {
        Self {
            cache_disabled: env::var("REPOCACHE_CACHE_DISABLED")
                .ok()
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            no_cache_types: env::var("REPOCACHE_NO_CACHE_TYPES")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
            cache_max_entries: env::var("CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(10_000),
        }
    }

    /// Builds a metadata catalog honoring `no_cache_types`.
    pub fn catalog(&self) -> MetadataCatalog {
        MetadataCatalog::new().with_no_cache_types(self.no_cache_types.iter().cloned())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
