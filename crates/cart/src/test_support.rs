//! Storage doubles for unit tests.

use async_trait::async_trait;
use tokio::sync::{Mutex, Semaphore, watch};

use crate::error::StorageError;
use crate::storage::KeyValueStore;

/// Every call fails.
pub struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("read refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: String) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("write refused".to_string()))
    }
}

/// Every call hangs forever.
pub struct HangingStore;

#[async_trait]
impl KeyValueStore for HangingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        std::future::pending().await
    }

    async fn set(&self, _key: &str, _value: String) -> Result<(), StorageError> {
        std::future::pending().await
    }
}

/// Holds reads and writes until [`GatedStore::open`] is called.
pub struct GatedStore {
    gate: Semaphore,
    value: Option<String>,
    started: watch::Sender<usize>,
    completed: watch::Sender<usize>,
    writes: Mutex<Vec<String>>,
}

impl GatedStore {
    pub fn new() -> Self {
        Self::with_value(None)
    }

    /// Reads return `value` once the gate opens.
    pub fn with_value(value: Option<String>) -> Self {
        Self {
            gate: Semaphore::new(0),
            value,
            started: watch::channel(0).0,
            completed: watch::channel(0).0,
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn open(&self) {
        self.gate.add_permits(1);
    }

    pub async fn wait_for_write_started(&self) {
        let _ = self.started.subscribe().wait_for(|n| *n >= 1).await;
    }

    pub async fn wait_for_writes(&self, count: usize) {
        let _ = self.completed.subscribe().wait_for(|n| *n >= count).await;
    }

    pub async fn writes(&self) -> Vec<String> {
        self.writes.lock().await.clone()
    }

    async fn pass_gate(&self) -> Result<(), StorageError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for GatedStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        self.pass_gate().await?;
        Ok(self.value.clone())
    }

    async fn set(&self, _key: &str, value: String) -> Result<(), StorageError> {
        self.started.send_modify(|n| *n += 1);
        self.pass_gate().await?;
        self.writes.lock().await.push(value);
        self.completed.send_modify(|n| *n += 1);
        Ok(())
    }
}
