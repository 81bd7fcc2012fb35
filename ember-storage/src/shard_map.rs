//! Concurrent point-lookup map, sharded into independently locked buckets.

use std::hash::BuildHasher;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::RandomState;
use ember_core::{Key, VersionedValue};
use parking_lot::RwLock;

struct Bucket {
    slots: RwLock<Vec<(Key, VersionedValue)>>,
}

/// Fixed-bucket hash map holding the latest version per key.
///
/// Writers lock only the target bucket, so contention is confined to keys
/// that share a bucket. Updates replace the slot in place under the bucket's
/// write lock; the full per-key history lives in the skip list, not here.
pub struct ShardedMap {
    buckets: Box<[Bucket]>,
    hasher: RandomState,
    distinct_keys: AtomicU64,
}

impl ShardedMap {
    /// Create a map with a fixed number of buckets.
    pub fn new(num_buckets: usize) -> Self {
        assert!(num_buckets > 0, "bucket count must be non-zero");
        let buckets = (0..num_buckets)
            .map(|_| Bucket {
                slots: RwLock::new(Vec::new()),
            })
            .collect();
        Self {
            buckets,
            hasher: RandomState::new(),
            distinct_keys: AtomicU64::new(0),
        }
    }

    fn bucket_for(&self, key: &[u8]) -> &Bucket {
        let hash = self.hasher.hash_one(key);
        let index = (hash % self.buckets.len() as u64) as usize;
        &self.buckets[index]
    }

    /// Insert or overwrite the latest value for `key`.
    ///
    /// Panics if an existing slot already holds an equal or newer version;
    /// the MemTable's version gate rejects those before they get here.
    pub fn put(&self, key: Key, value: VersionedValue) {
        let bucket = self.bucket_for(&key);
        let mut slots = bucket.slots.write();
        if let Some(slot) = slots.iter_mut().find(|(existing, _)| *existing == key) {
            assert!(
                value.version > slot.1.version,
                "version {} does not advance past current version {}",
                value.version,
                slot.1.version
            );
            slot.1 = value;
        } else {
            slots.push((key, value));
            self.distinct_keys.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Latest value for `key`, if present.
    pub fn get(&self, key: &[u8]) -> Option<VersionedValue> {
        let slots = self.bucket_for(key).slots.read();
        slots
            .iter()
            .find(|(existing, _)| existing.as_ref() == key)
            .map(|(_, value)| value.clone())
    }

    /// Number of distinct keys ever inserted.
    pub fn len(&self) -> u64 {
        self.distinct_keys.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn vv(value: &'static [u8], version: u64) -> VersionedValue {
        VersionedValue::new(value, version)
    }

    #[test]
    fn test_put_and_get() {
        let map = ShardedMap::new(16);
        map.put(Key::from_static(b"hello"), vv(b"world", 1));

        let got = map.get(b"hello").unwrap();
        assert_eq!(&got.value[..], b"world");
        assert_eq!(got.version, 1);
        assert_eq!(map.len(), 1);
        assert!(map.get(b"missing").is_none());
    }

    #[test]
    fn test_multiple_keys() {
        let map = ShardedMap::new(16);
        let data = [("a", "1"), ("b", "2"), ("c", "3")];

        for (i, (k, v)) in data.iter().enumerate() {
            map.put(Key::from(k.as_bytes().to_vec()), vv_bytes(v, i as u64 + 1));
        }

        for (i, (k, v)) in data.iter().enumerate() {
            let got = map.get(k.as_bytes()).unwrap();
            assert_eq!(&got.value[..], v.as_bytes());
            assert_eq!(got.version, i as u64 + 1);
        }
        assert_eq!(map.len(), 3);
    }

    fn vv_bytes(value: &str, version: u64) -> VersionedValue {
        VersionedValue::new(value.as_bytes().to_vec(), version)
    }

    #[test]
    fn test_update_replaces_latest_without_growing() {
        let map = ShardedMap::new(4);
        map.put(Key::from_static(b"k"), vv(b"v1", 1));
        map.put(Key::from_static(b"k"), vv(b"v2", 2));

        let got = map.get(b"k").unwrap();
        assert_eq!(&got.value[..], b"v2");
        assert_eq!(got.version, 2);
        assert_eq!(map.len(), 1);
    }

    #[test]
    #[should_panic(expected = "does not advance")]
    fn test_stale_update_panics() {
        let map = ShardedMap::new(4);
        map.put(Key::from_static(b"k"), vv(b"v2", 2));
        map.put(Key::from_static(b"k"), vv(b"v1", 1));
    }

    #[test]
    fn test_concurrent_access() {
        let map = Arc::new(ShardedMap::new(16));
        let num_threads = 8;
        let ops_per_thread = 500;

        let handles: Vec<_> = (0..num_threads)
            .map(|t| {
                let map = Arc::clone(&map);
                thread::spawn(move || {
                    for i in 0..ops_per_thread {
                        let key = format!("key-{t}-{i}").into_bytes();
                        let value = format!("val-{t}-{i}").into_bytes();
                        map.put(Key::from(key.clone()), VersionedValue::new(value.clone(), 1));
                        let got = map.get(&key).expect("just-written key must be visible");
                        assert_eq!(&got.value[..], &value[..]);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(map.len(), (num_threads * ops_per_thread) as u64);
    }
}
