//! The MemTable: synchronous point-lookup writes, asynchronously maintained
//! ordered index, and an explicit seal/flush lifecycle.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use ember_core::{
    error::{Error, Result},
    metrics::Metrics,
    utils::format_bytes,
    Record, VersionedValue,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::types::{MemTableConfig, MemTableStats};
use crate::shard_map::ShardedMap;
use crate::skiplist::SkipList;
use crate::versions::VersionStack;

/// Destination for a flushed MemTable.
///
/// Receives every key in ascending byte order together with its full version
/// history. Invoked only after the MemTable is sealed and the index queue has
/// drained, so the sequence is complete and duplicate-free.
pub trait FlushSink {
    fn write(&mut self, key: &[u8], history: &VersionStack) -> Result<()>;
}

// Work items for the index worker. Queue order is application order, so a
// barrier acknowledges only after everything enqueued before it is applied.
enum IndexTask {
    Apply(Record),
    Barrier(Sender<()>),
    Shutdown,
}

/// In-memory mutable store accepting versioned writes before durable flush.
///
/// Writes land synchronously in the sharded map (a `get` right after a `put`
/// sees the write) and are queued for the skip list, which one dedicated
/// worker maintains for the MemTable's whole active lifetime. The map is
/// therefore always at least as fresh as the skip list; anything that needs
/// the skip list's complete ordered view goes through [`MemTable::drain`]
/// first.
pub struct MemTable {
    map: ShardedMap,
    // Single mutator (the worker) plus post-barrier flush iteration; the
    // skip list itself carries no locks.
    index: Arc<Mutex<SkipList>>,
    index_tx: Sender<IndexTask>,
    worker: Option<JoinHandle<()>>,
    // Serializes accepted writes: the map and the index queue must observe
    // records in version order, or the per-key history asserts trip.
    write_order: Mutex<()>,

    write_count: AtomicU64,
    byte_size: AtomicU64,
    latest_version: AtomicU64,

    closed: AtomicBool,
    flushed: AtomicBool,

    config: MemTableConfig,
    metrics: Arc<Metrics>,
}

impl MemTable {
    /// Create an empty, active MemTable and start its index worker.
    ///
    /// Panics if the configured capacity is not a power of two.
    pub fn new(config: MemTableConfig, metrics: Arc<Metrics>) -> Result<Self> {
        let index = Arc::new(Mutex::new(SkipList::new(
            config.estimated_capacity,
            config.level_probability,
        )));
        let map = ShardedMap::new(config.estimated_capacity as usize);
        let (index_tx, index_rx) = bounded(config.index_queue_capacity);

        let worker_index = Arc::clone(&index);
        let worker_metrics = Arc::clone(&metrics);
        let worker = thread::Builder::new()
            .name("memtable-index".into())
            .spawn(move || apply_loop(index_rx, worker_index, worker_metrics))?;

        Ok(Self {
            map,
            index,
            index_tx,
            worker: Some(worker),
            write_order: Mutex::new(()),
            write_count: AtomicU64::new(0),
            byte_size: AtomicU64::new(0),
            latest_version: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            flushed: AtomicBool::new(false),
            config,
            metrics,
        })
    }

    /// Accept one versioned write.
    ///
    /// Fails with [`Error::Closed`] once the MemTable is sealed and with
    /// [`Error::VersionRegression`] if the version does not advance past the
    /// latest accepted one; a rejected write mutates nothing. Blocks if the
    /// index queue is full.
    pub fn put(&self, record: Record) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            self.metrics.record_rejected();
            return Err(Error::Closed);
        }

        let version = record.version;
        let footprint = record.footprint() as u64;

        // Gate, map write, and enqueue are one critical section: a writer
        // that passes the gate lands in the map and on the queue before the
        // next writer's gate check, so both structures see records in
        // version order even for the same key.
        let ordered = self.write_order.lock();
        let latest = self.latest_version.load(Ordering::Relaxed);
        if version <= latest {
            drop(ordered);
            self.metrics.record_rejected();
            warn!(version, latest, "rejected non-advancing write");
            return Err(Error::VersionRegression { version, latest });
        }
        self.latest_version.store(version, Ordering::Release);
        self.map.put(
            record.key.clone(),
            VersionedValue::new(record.value.clone(), version),
        );
        // Blocks when the queue is full: bounded memory for pending index
        // work, at the cost of stalling writers while the skip list lags.
        self.index_tx
            .send(IndexTask::Apply(record))
            .map_err(|_| Error::Internal {
                message: "index worker is gone".to_string(),
            })?;
        drop(ordered);

        self.byte_size.fetch_add(footprint, Ordering::Relaxed);
        self.write_count.fetch_add(1, Ordering::Relaxed);
        self.metrics.record_write(footprint);
        Ok(())
    }

    /// Latest value for `key`. Not-found once the MemTable is flushed: the
    /// data is then authoritative in durable storage only.
    pub fn get(&self, key: &[u8]) -> Option<VersionedValue> {
        if self.flushed.load(Ordering::Acquire) {
            return None;
        }
        self.map.get(key)
    }

    /// Block until the index worker has applied every record enqueued before
    /// this call. Must run before any ordered iteration of the skip list.
    pub fn drain(&self) -> Result<()> {
        let (ack_tx, ack_rx) = bounded(1);
        self.index_tx
            .send(IndexTask::Barrier(ack_tx))
            .map_err(|_| Error::Internal {
                message: "index worker is gone".to_string(),
            })?;
        ack_rx.recv().map_err(|_| Error::Internal {
            message: "index worker dropped the drain barrier".to_string(),
        })
    }

    /// Seal the MemTable against further writes. One-way.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(
                writes = self.write_count.load(Ordering::Relaxed),
                "memtable closed to writes"
            );
        }
    }

    /// Flush the MemTable: seal it, drain the index queue, then hand every
    /// key's full history to `sink` in ascending key order.
    ///
    /// Exactly one call succeeds; later calls fail with
    /// [`Error::AlreadyFlushed`]. After the winning call starts, reads
    /// report not-found.
    pub fn flush<S: FlushSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        if self.flushed.swap(true, Ordering::AcqRel) {
            return Err(Error::AlreadyFlushed);
        }
        self.closed.store(true, Ordering::Release);

        self.drain()?;

        let index = self.index.lock();
        let mut keys = 0u64;
        for entry in index.iter() {
            sink.write(entry.key(), entry.versions())?;
            keys += 1;
        }

        self.metrics.record_flush();
        info!(
            keys,
            size = %format_bytes(self.byte_size.load(Ordering::Relaxed)),
            "memtable flushed"
        );
        Ok(())
    }

    /// Accepted write operations, updates included.
    pub fn size(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    /// Accumulated key + value bytes across accepted writes.
    pub fn byte_size(&self) -> u64 {
        self.byte_size.load(Ordering::Relaxed)
    }

    /// Highest version accepted so far.
    pub fn latest_version(&self) -> u64 {
        self.latest_version.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn is_flushed(&self) -> bool {
        self.flushed.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &MemTableConfig {
        &self.config
    }

    pub fn stats(&self) -> MemTableStats {
        MemTableStats {
            write_count: self.write_count.load(Ordering::Relaxed),
            byte_size: self.byte_size.load(Ordering::Relaxed),
            distinct_keys: self.map.len(),
            latest_version: self.latest_version.load(Ordering::Acquire),
            closed: self.is_closed(),
            flushed: self.is_flushed(),
        }
    }
}

impl Drop for MemTable {
    // The queue is FIFO, so the shutdown task lets the worker finish every
    // pending insert before the skip list's owner goes away.
    fn drop(&mut self) {
        let _ = self.index_tx.send(IndexTask::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("index worker panicked during shutdown");
            }
        }
    }
}

fn apply_loop(tasks: Receiver<IndexTask>, index: Arc<Mutex<SkipList>>, metrics: Arc<Metrics>) {
    debug!("index worker started");
    for task in tasks {
        match task {
            IndexTask::Apply(record) => {
                let mut index = index.lock();
                index.put(record.key, record.value, record.version);
                metrics.record_index_apply();
            }
            IndexTask::Barrier(ack) => {
                // Everything enqueued before the barrier is applied by now.
                let _ = ack.send(());
            }
            IndexTask::Shutdown => break,
        }
    }
    debug!("index worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::{Key, Value};

    fn memtable() -> MemTable {
        MemTable::new(MemTableConfig::default(), Arc::new(Metrics::new())).unwrap()
    }

    fn record(key: &'static [u8], value: &'static [u8], version: u64) -> Record {
        Record::new(Key::from_static(key), Value::from_static(value), version)
    }

    #[test]
    fn test_put_then_get_returns_exact_write() {
        let table = memtable();
        table.put(record(b"k", b"v", 1)).unwrap();

        let got = table.get(b"k").unwrap();
        assert_eq!(&got.value[..], b"v");
        assert_eq!(got.version, 1);
    }

    #[test]
    fn test_byte_size_accumulates_updates() {
        let table = memtable();
        table.put(record(b"key", b"val", 1)).unwrap();
        table.put(record(b"key", b"longer", 2)).unwrap();

        assert_eq!(table.size(), 2);
        assert_eq!(table.byte_size(), (3 + 3 + 3 + 6) as u64);
    }

    #[test]
    fn test_version_gate_leaves_state_unchanged() {
        let table = memtable();
        table.put(record(b"k", b"v5", 5)).unwrap();

        let err = table.put(record(b"k", b"v3", 3)).unwrap_err();
        assert!(matches!(
            err,
            Error::VersionRegression {
                version: 3,
                latest: 5
            }
        ));

        let got = table.get(b"k").unwrap();
        assert_eq!(&got.value[..], b"v5");
        assert_eq!(got.version, 5);
        assert_eq!(table.size(), 1);
        assert_eq!(table.byte_size(), 3);
    }

    #[test]
    fn test_drop_joins_worker_after_draining() {
        let table = memtable();
        for version in 1..=100 {
            table.put(record(b"k", b"v", version)).unwrap();
        }
        // Dropping with queued index work must join the worker cleanly.
        drop(table);
    }
}
