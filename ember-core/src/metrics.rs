//! # Metrics
//!
//! Write-path metrics collection. Counters are lock-free atomics so the hot
//! path pays a single relaxed increment.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone, Default)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    // Write metrics
    records_written: AtomicU64,
    bytes_written: AtomicU64,
    writes_rejected: AtomicU64,

    // Ordered-index metrics
    index_applied: AtomicU64,

    // Lifecycle metrics
    memtable_flushes: AtomicU64,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted write and its byte footprint
    pub fn record_write(&self, bytes: u64) {
        self.inner.records_written.fetch_add(1, Ordering::Relaxed);
        self.inner.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a rejected write (lifecycle or version gate)
    pub fn record_rejected(&self) {
        self.inner.writes_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one record applied to the ordered index
    pub fn record_index_apply(&self) {
        self.inner.index_applied.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a MemTable flush
    pub fn record_flush(&self) {
        self.inner.memtable_flushes.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_written: self.inner.records_written.load(Ordering::Relaxed),
            bytes_written: self.inner.bytes_written.load(Ordering::Relaxed),
            writes_rejected: self.inner.writes_rejected.load(Ordering::Relaxed),
            index_applied: self.inner.index_applied.load(Ordering::Relaxed),
            memtable_flushes: self.inner.memtable_flushes.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub records_written: u64,
    pub bytes_written: u64,
    pub writes_rejected: u64,
    pub index_applied: u64,
    pub memtable_flushes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_counters() {
        let metrics = Metrics::new();
        metrics.record_write(10);
        metrics.record_write(32);
        metrics.record_rejected();
        metrics.record_index_apply();
        metrics.record_flush();

        let snap = metrics.snapshot();
        assert_eq!(snap.records_written, 2);
        assert_eq!(snap.bytes_written, 42);
        assert_eq!(snap.writes_rejected, 1);
        assert_eq!(snap.index_applied, 1);
        assert_eq!(snap.memtable_flushes, 1);
    }

    #[test]
    fn test_metrics_clone_shares_counters() {
        let metrics = Metrics::new();
        let clone = metrics.clone();
        clone.record_write(5);
        assert_eq!(metrics.snapshot().records_written, 1);
    }
}
