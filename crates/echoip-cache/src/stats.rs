use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of cache occupancy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Maximum number of entries, 0 when caching is disabled
    pub capacity: usize,
    /// Current number of entries
    pub size: usize,
    /// Entries evicted since construction or the last resize
    pub evictions: u64,
}

impl CacheStats {
    /// Whether the cache stores anything at all
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.capacity > 0
    }
}
