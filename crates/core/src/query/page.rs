use serde::{Deserialize, Serialize};

/// One page of a paginated query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub offset: u64,
    pub size: u64,
    /// Number of matches across all pages.
    pub total: u64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(offset: u64, size: u64, total: u64, items: Vec<T>) -> Self {
        Self {
            offset,
            size,
            total,
            items,
        }
    }

    /// Replaces the items, keeping the counters.
    pub fn with_items<U>(self, items: Vec<U>) -> Page<U> {
        Page {
            offset: self.offset,
            size: self.size,
            total: self.total,
            items,
        }
    }
}
