//! Storage Module
//!
//! Byte-level storage engines the paged result store persists through.

mod file;
mod memory;

use async_trait::async_trait;

use crate::error::StorageError;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Minimal key/bytes contract for a backing store.
///
/// `save` must replace the value for a key in one step: a reader never
/// observes a partially written value.
#[async_trait]
pub trait StorageEngine: Send + Sync + std::fmt::Debug {
    /// Returns the bytes stored under `key`, or None if absent.
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    async fn save(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError>;

    /// Removes `key`; absent keys are not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}
