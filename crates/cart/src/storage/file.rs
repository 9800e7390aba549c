use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use super::KeyValueStore;
use crate::error::StorageError;

/// Key-value store backed by a single JSON object file.
///
/// The file maps keys to string values, e.g.
/// `{"@GoMarket:Products": "[{\"id\":\"a\",...}]"}`. A missing file reads as
/// an empty store. Writes go to a sibling temp file that is then renamed over
/// the original, so a crash mid-write leaves the previous contents intact.
///
/// Each `set` runs on a blocking thread that holds the store lock until the
/// rename is done. Dropping the `set` future (e.g. on a write timeout) stops
/// the wait, not the write, so an abandoned write can neither leave a temp
/// file behind nor land after a later one.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Arc<Mutex<()>>,
}

impl FileStore {
    /// Create a store at `path`. The file is not touched until first use.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, String>, StorageError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(e.into()),
    };

    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    serde_json::from_str(&contents)
        .map_err(|e| StorageError::Corrupt(format!("{}: {e}", path.display())))
}

fn write_entries(path: &Path, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
    let contents =
        serde_json::to_string_pretty(entries).map_err(|e| StorageError::Corrupt(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = TempFile::new(path.with_extension(format!("{}.tmp", Uuid::new_v4())));
    std::fs::write(&tmp.path, contents)?;
    std::fs::rename(&tmp.path, path)?;
    tmp.keep();
    Ok(())
}

fn set_entry(path: &Path, key: String, value: String) -> Result<(), StorageError> {
    let mut entries = match read_entries(path) {
        Ok(entries) => entries,
        Err(StorageError::Corrupt(reason)) => {
            warn!(%reason, "Replacing unreadable storage file");
            BTreeMap::new()
        }
        Err(e) => return Err(e),
    };

    entries.insert(key, value);
    write_entries(path, &entries)
}

/// Temp file that is removed on drop unless [`keep`](Self::keep) is called.
struct TempFile {
    path: PathBuf,
    armed: bool,
}

impl TempFile {
    const fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    /// The file was renamed into place; nothing to clean up.
    fn keep(mut self) {
        self.armed = false;
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        let mut entries = tokio::task::spawn_blocking(move || read_entries(&path))
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))??;
        Ok(entries.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let guard = Arc::clone(&self.lock).lock_owned().await;
        let path = self.path.clone();
        let key = key.to_owned();

        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            set_entry(&path, key, value)?;
            debug!(path = %path.display(), "Storage file written");
            Ok(())
        })
        .await
        .map_err(|e| StorageError::Unavailable(e.to_string()))?
    }
}
