//! Key-value storage backends for the persisted cart.
//!
//! The cart only needs two calls from a backend: read a string by key and
//! write a string by key. Backends are shared behind `Arc<dyn KeyValueStore>`
//! so the store, its background writer, and tests can all hold the same one.
//!
//! - [`MemoryStore`] - In-process map, for tests and ephemeral sessions
//! - [`FileStore`] - A JSON object file on disk, survives restarts

use async_trait::async_trait;

use crate::error::StorageError;

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Asynchronous string key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if nothing is stored.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
}
