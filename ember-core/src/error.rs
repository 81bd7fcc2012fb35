//! # Error Handling
//!
//! Error types for EmberDB write-path operations.
//!
//! Lifecycle violations (writing to a closed MemTable, flushing twice) are
//! recoverable: the coordinator rotates in a fresh MemTable and retries.
//! Version regressions are surfaced as errors so the offending operation
//! aborts without mutating state, but they indicate a broken version
//! allocator and are not retryable as-is.

use thiserror::Error;

/// Result type alias for EmberDB operations
pub type Result<T> = std::result::Result<T, Error>;

/// Primary error type for EmberDB
#[derive(Error, Debug)]
pub enum Error {
    /// The MemTable has been sealed against writes.
    #[error("memtable is closed to writes")]
    Closed,

    /// The MemTable has already been flushed; its contents are authoritative
    /// in durable storage only.
    #[error("memtable is already flushed")]
    AlreadyFlushed,

    /// A write carried a version that does not advance past the latest
    /// version this MemTable has seen.
    #[error("version {version} does not advance past latest version {latest}")]
    VersionRegression { version: u64, latest: u64 },

    /// A flush sink rejected data handed to it.
    #[error("flush sink error: {message}")]
    FlushSink { message: String },

    #[error("IO error: {message}")]
    Io {
        message: String,
        source: std::io::Error,
    },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl Error {
    /// Check if the error is recoverable by retrying against a freshly
    /// rotated MemTable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Closed => true,
            Error::AlreadyFlushed => true,
            Error::VersionRegression { .. } => false,
            Error::FlushSink { .. } => false,
            Error::Io { .. } => false,
            Error::Internal { .. } => false,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}
