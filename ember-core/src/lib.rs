//! # EmberDB Core
//!
//! Shared building blocks for the EmberDB write path:
//! - Core data types (keys, values, versioned records)
//! - Error types
//! - Metrics collection
//! - Common utilities
//!
//! The storage crate composes these into the MemTable write path; the
//! coordinator, write-ahead log, and flush pipeline live outside this
//! workspace and consume the types defined here.

pub mod error;
pub mod metrics;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::{Key, Record, Value, VersionedValue};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
