//! MemTable configuration and observable state.

#[derive(Debug, Clone)]
pub struct MemTableConfig {
    /// Expected number of distinct keys. Must be a power of two: it sizes
    /// the sharded map's bucket count and the skip list's max level height.
    pub estimated_capacity: u64,
    /// Probability of growing a skip-list node by one more level.
    pub level_probability: f64,
    /// Bound on queued ordered-index work. A full queue blocks writers
    /// rather than dropping records.
    pub index_queue_capacity: usize,
}

impl Default for MemTableConfig {
    fn default() -> Self {
        Self {
            estimated_capacity: 1024,
            level_probability: 0.5,
            index_queue_capacity: 1024,
        }
    }
}

/// Point-in-time counters for one MemTable.
#[derive(Debug, Clone, Default)]
pub struct MemTableStats {
    /// Accepted write operations, updates included.
    pub write_count: u64,
    /// Accumulated key + value bytes across accepted writes.
    pub byte_size: u64,
    /// Distinct keys in the point-lookup map.
    pub distinct_keys: u64,
    /// Highest version this MemTable has accepted.
    pub latest_version: u64,
    pub closed: bool,
    pub flushed: bool,
}
