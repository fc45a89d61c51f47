//! Key/value storage abstraction layer
//!
//! Provides a `KeyValueStore` trait that decouples the access ledger from the
//! underlying persistence. Two implementations:
//! - `MemoryStore`: in-memory, used by tests and short-lived hosts
//! - `FileStore`: a JSON document on disk, shared by every process that opens it
//!
//! Values are plain strings; callers own their encoding (RFC 3339 timestamps,
//! JSON blobs). No locking is done across processes: last writer wins.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use anyhow::Result;

/// Abstract string key/value storage, scoped to one origin.
///
/// Returns owned values so callers don't hold locks.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key is absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key; deleting an absent key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// List all keys currently stored
    fn keys(&self) -> Result<Vec<String>>;
}
