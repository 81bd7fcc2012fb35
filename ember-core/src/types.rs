//! Core data types for the write path.
//!
//! Keys and values are immutable byte sequences (`bytes::Bytes`), so a record
//! can feed both the point-lookup map and the ordered-index queue without
//! copying payloads. Keys order by byte-lexicographic comparison.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Raw key bytes, ordered lexicographically.
pub type Key = Bytes;

/// Raw value bytes.
pub type Value = Bytes;

/// A value tagged with the version that wrote it.
///
/// Versions strictly increase per key across writes; the structures that
/// store these enforce that invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedValue {
    pub value: Value,
    pub version: u64,
}

impl VersionedValue {
    pub fn new(value: impl Into<Value>, version: u64) -> Self {
        Self {
            value: value.into(),
            version,
        }
    }
}

/// A single write as handed to the MemTable: key, value, and the version the
/// coordinator allocated for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub key: Key,
    pub value: Value,
    pub version: u64,
}

impl Record {
    pub fn new(key: impl Into<Key>, value: impl Into<Value>, version: u64) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            version,
        }
    }

    /// Bytes this record contributes to a MemTable's accumulated footprint.
    pub fn footprint(&self) -> usize {
        self.key.len() + self.value.len()
    }

    /// Split into the versioned value the read path stores, keeping the key.
    pub fn into_versioned(self) -> (Key, VersionedValue) {
        (
            self.key,
            VersionedValue {
                value: self.value,
                version: self.version,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_footprint() {
        let record = Record::new(&b"key"[..], &b"value"[..], 1);
        assert_eq!(record.footprint(), 8);
    }

    #[test]
    fn test_record_into_versioned() {
        let record = Record::new(&b"k"[..], &b"v"[..], 7);
        let (key, versioned) = record.into_versioned();
        assert_eq!(&key[..], b"k");
        assert_eq!(&versioned.value[..], b"v");
        assert_eq!(versioned.version, 7);
    }

    #[test]
    fn test_key_ordering_is_lexicographic() {
        let a = Key::from_static(b"abc");
        let b = Key::from_static(b"abd");
        assert!(a < b);
    }
}
