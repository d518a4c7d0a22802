//! Key-value storage for persisted carts.
//!
//! Mirrors browser `localStorage`: string keys, string values, whole-value
//! reads and overwrites. The cart store keeps one key holding the full
//! serialized cart.

use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;

/// Errors that can occur when reading or writing storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not a JSON object of string values.
    #[error("storage format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// Durable string key-value storage.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Read the value for `key`, or `None` if it was never written.
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the value for `key`. The write is all-or-nothing.
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

// =============================================================================
// FileStorage
// =============================================================================

/// File-backed storage: one JSON object mapping keys to values.
///
/// Writes go to a sibling temp file that is then renamed over the original,
/// so readers never observe a half-written file. The file and its parent
/// directory are created on first write.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_map().await?.remove(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut map = self.read_map().await?;
        map.insert(key.to_string(), value.to_string());
        let data = serde_json::to_vec_pretty(&map)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let tmp = self.temp_path();
        fs::write(&tmp, data).await?;
        fs::rename(&tmp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), key, "Storage item written");
        Ok(())
    }
}

// =============================================================================
// MemoryStorage
// =============================================================================

/// Process-local storage. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with one entry.
    #[must_use]
    pub fn with_item(key: &str, value: &str) -> Self {
        let storage = Self::new();
        storage
            .items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        storage
    }

    /// Synchronous read, handy for assertions.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<String> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.peek(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_file() -> PathBuf {
        std::env::temp_dir()
            .join(format!("rocketshoes_storage_{}", Uuid::new_v4()))
            .join("cart.json")
    }

    #[tokio::test]
    async fn test_file_storage_missing_file_reads_none() {
        let storage = FileStorage::new(temp_file());
        assert_eq!(storage.get_item("@RocketShoes:cart").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_storage_persists_across_instances() {
        let path = temp_file();

        let storage = FileStorage::new(&path);
        storage.set_item("a", "[1]").await.unwrap();
        storage.set_item("b", "[2]").await.unwrap();
        storage.set_item("a", "[3]").await.unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get_item("a").await.unwrap().as_deref(), Some("[3]"));
        assert_eq!(reopened.get_item("b").await.unwrap().as_deref(), Some("[2]"));
        assert!(!storage.temp_path().exists());

        let _ = fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test]
    async fn test_file_storage_corrupt_file_is_an_error() {
        let path = temp_file();
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(&path, b"not json").await.unwrap();

        let storage = FileStorage::new(&path);
        assert!(matches!(
            storage.get_item("a").await,
            Err(StorageError::Format(_))
        ));

        let _ = fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test]
    async fn test_memory_storage_overwrites() {
        let storage = MemoryStorage::with_item("k", "old");
        storage.set_item("k", "new").await.unwrap();
        assert_eq!(storage.get_item("k").await.unwrap().as_deref(), Some("new"));
        assert_eq!(storage.peek("missing"), None);
    }
}
