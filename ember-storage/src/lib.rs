//! # EmberDB Write Path
//!
//! In-memory write path of a versioned key-value store.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Write Path                            │
//! │                                                              │
//! │  put(record) ──► ShardedMap (synchronous, latest value)      │
//! │       │                                                      │
//! │       └────────► bounded queue ──► index worker ──► SkipList │
//! │                                                   (history)  │
//! │                                                              │
//! │  Read Path                                                   │
//! │                                                              │
//! │  get(key) ──► ShardedMap  (always at least as fresh as the   │
//! │                            skip list)                        │
//! │                                                              │
//! │  Flush Path                                                  │
//! │                                                              │
//! │  flush(sink) ──► seal ──► drain barrier ──► ordered          │
//! │                           SkipList iteration ──► sink        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The map serves point lookups with the latest value per key; the skip list
//! keeps the full per-key version history in ascending key order for flush.
//! One dedicated worker per MemTable applies queued records to the skip list,
//! so the slower, serialized ordered insert stays off the write's critical
//! path. Anything needing the skip list's complete view must first issue the
//! drain barrier.

pub mod memtable;
pub mod probability;
pub mod shard_map;
pub mod skiplist;
pub mod versions;

pub use memtable::{FlushSink, MemTable, MemTableConfig, MemTableStats};
pub use shard_map::ShardedMap;
pub use skiplist::SkipList;
pub use versions::VersionStack;
