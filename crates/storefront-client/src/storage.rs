//! Durable session storage
//!
//! A small key-value seam ([`KeyValueStorage`]) with two backends:
//! - [`FileStorage`]: one JSON file per key under a directory
//! - [`MemoryStorage`]: process-local map, for tests and ephemeral runs
//!
//! [`SessionVault`] stores the signed-in user under [`SESSION_KEY`].

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storefront_core::{StorageError, StorageOp, User};

/// Key the signed-in user is stored under
pub const SESSION_KEY: &str = "user";

/// Key-value storage for serialized records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Read a record; `None` when absent
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a record, replacing any previous one
    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a record; deleting an absent key succeeds
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// File-per-key storage
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at `dir` (created on first write)
    #[inline]
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(StorageOp::Read, key, e)),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StorageError::io(StorageOp::Write, key, e))?;

        // Write beside the target and rename so readers never see a torn record
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| StorageError::io(StorageOp::Write, key, e))?;
        tokio::fs::rename(&tmp, self.path_for(key))
            .await
            .map_err(|e| StorageError::io(StorageOp::Write, key, e))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(StorageOp::Delete, key, e)),
        }
    }
}

/// In-memory storage
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create empty storage
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Typed access to the persisted session
#[derive(Clone)]
pub struct SessionVault {
    storage: Arc<dyn KeyValueStorage>,
}

impl SessionVault {
    /// Create vault over a storage backend
    #[inline]
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Read the saved user
    ///
    /// # Errors
    /// - `StorageError::Io` if the backend read fails
    /// - `StorageError::Corrupt` if the record is not a serialized user
    pub async fn load(&self) -> Result<Option<User>, StorageError> {
        let Some(text) = self.storage.get(SESSION_KEY).await? else {
            return Ok(None);
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                key: SESSION_KEY.to_string(),
                source,
            })
    }

    /// Persist the user
    ///
    /// # Errors
    /// - `StorageError::Encode` if serialization fails
    /// - `StorageError::Io` if the backend write fails
    pub async fn save(&self, user: &User) -> Result<(), StorageError> {
        let text = serde_json::to_string(user).map_err(|source| StorageError::Encode {
            key: SESSION_KEY.to_string(),
            source,
        })?;
        self.storage.put(SESSION_KEY, &text).await
    }

    /// Delete the saved user
    ///
    /// # Errors
    /// - `StorageError::Io` if the backend delete fails
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.storage.delete(SESSION_KEY).await
    }
}

impl std::fmt::Debug for SessionVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionVault")
            .field("key", &SESSION_KEY)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use storefront_core::UserId;

    fn ada() -> User {
        User::new(UserId(7), "ada@example.com", "Ada").with_avatar("https://img/ada.png")
    }

    #[tokio::test]
    async fn file_storage_round_trips_and_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        assert_eq!(storage.get("user").await.unwrap(), None);

        storage.put("user", "{\"a\":1}").await.unwrap();
        assert_eq!(storage.get("user").await.unwrap().as_deref(), Some("{\"a\":1}"));

        storage.delete("user").await.unwrap();
        assert_eq!(storage.get("user").await.unwrap(), None);
    }

    #[tokio::test]
    async fn deleting_absent_key_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        assert!(storage.delete("never-written").await.is_ok());
    }

    #[tokio::test]
    async fn vault_saves_and_loads_user() {
        let vault = SessionVault::new(Arc::new(MemoryStorage::new()));

        vault.save(&ada()).await.unwrap();
        assert_eq!(vault.load().await.unwrap(), Some(ada()));

        vault.clear().await.unwrap();
        assert_eq!(vault.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_record_is_reported() {
        let storage = MemoryStorage::new();
        storage.put(SESSION_KEY, "not json").await.unwrap();
        let vault = SessionVault::new(Arc::new(storage));

        let err = vault.load().await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { ref key, .. } if key == "user"));
    }

    #[tokio::test]
    async fn vault_propagates_backend_failure() {
        let mut storage = MockKeyValueStorage::new();
        storage.expect_get().returning(|key| {
            Err(StorageError::io(
                StorageOp::Read,
                key,
                io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            ))
        });
        let vault = SessionVault::new(Arc::new(storage));

        assert!(matches!(vault.load().await, Err(StorageError::Io { op: StorageOp::Read, .. })));
    }
}
