//! Whole-file JSON storage for the user collection.
//!
//! Every `load` reads and decodes the entire file; every `persist` re-encodes the
//! entire collection and overwrites the file in place. There is no lock and no
//! atomic rename, so a crash mid-write or two overlapping writers can lose data.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::contract::model::User;
use crate::domain::error::StorageError;
use crate::domain::repo::UsersStore;

/// File-backed `UsersStore` holding a JSON array of user objects.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Seed an empty collection if the file does not exist yet.
    /// Returns true when a file was created.
    pub async fn ensure_exists(&self) -> Result<bool, StorageError> {
        let exists = tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| StorageError::read(&self.path, e))?;
        if exists {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::write(&self.path, e))?;
        }
        self.persist(&[]).await?;
        Ok(true)
    }
}

#[async_trait]
impl UsersStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<User>, StorageError> {
        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|e| StorageError::read(&self.path, e))?;
        let users: Vec<User> =
            serde_json::from_slice(&raw).map_err(|e| StorageError::decode(&self.path, e))?;
        debug!(path = %self.path.display(), count = users.len(), "loaded users");
        Ok(users)
    }

    async fn persist(&self, users: &[User]) -> Result<(), StorageError> {
        let raw = serde_json::to_vec(users).map_err(StorageError::encode)?;
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| StorageError::write(&self.path, e))?;
        debug!(path = %self.path.display(), count = users.len(), "persisted users");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn user(name: &str) -> User {
        let fields = match json!({ "name": name, "hobbies": ["a", "b"] }) {
            serde_json::Value::Object(m) => m,
            _ => unreachable!(),
        };
        User::new(Uuid::new_v4(), fields)
    }

    #[tokio::test]
    async fn persist_then_load_preserves_content_and_order() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("users.json"));
        let users = vec![user("Ann"), user("Bob"), user("Cid")];

        store.persist(&users).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, users);
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, StorageError::Read { .. }));
    }

    #[tokio::test]
    async fn malformed_file_is_a_decode_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, b"{not json").unwrap();

        let err = JsonFileStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, StorageError::Decode { .. }));
    }

    #[tokio::test]
    async fn record_without_id_is_a_decode_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, br#"[{"name":"Ann"}]"#).unwrap();

        let err = JsonFileStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, StorageError::Decode { .. }));
    }

    #[tokio::test]
    async fn write_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("no/such/dir/users.json"));

        let err = store.persist(&[user("Ann")]).await.unwrap_err();
        assert!(matches!(err, StorageError::Write { .. }));
    }

    #[tokio::test]
    async fn ensure_exists_seeds_empty_array_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/users.json");
        let store = JsonFileStore::new(&path);

        assert!(store.ensure_exists().await.unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");

        store.persist(&[user("Ann")]).await.unwrap();
        assert!(!store.ensure_exists().await.unwrap());
        assert_eq!(store.load().await.unwrap().len(), 1);
    }
}
