use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Result;
use fs4::tokio::AsyncFileExt;
use tokio::fs::File;
use tracing::{debug, warn};

use crate::fs::operations::write_atomically;

use super::KeyValueStore;

type Document = BTreeMap<String, String>;

/// The main realization of [KeyValueStore]. Every key lives in one small JSON object on disk:
/// `{"waterIntake": "750", "lastUpdated": "\"2025-03-15T10:00:00Z\""}`.
///
/// Writes are read-modify-write cycles guarded by an exclusive lock on a sibling `.lock` file, so
/// two processes poking at the same state don't lose each other's keys.
pub struct FileKeyValueStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(path: PathBuf) -> Self {
        let mut lock_name = path.file_name().unwrap_or_default().to_os_string();
        lock_name.push(".lock");
        let lock_path = path.with_file_name(lock_name);
        Self { path, lock_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open_lock(&self) -> Result<File, std::io::Error> {
        File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .await
    }

    async fn read_document(&self) -> Result<Document> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => Err(e)?,
        };

        match serde_json::from_str::<Document>(&content) {
            Ok(v) => Ok(v),
            Err(e) => {
                // A broken document is treated as empty, the next write replaces it.
                warn!("State file {:?} is corrupted, starting over: {e}", self.path);
                Ok(Document::new())
            }
        }
    }

    async fn update_document(&self, key: &str, value: String) -> Result<()> {
        let mut document = self.read_document().await?;
        document.insert(key.to_owned(), value);
        let buffer = serde_json::to_vec_pretty(&document)?;
        write_atomically(&self.path, &buffer).await?;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let lock = self.open_lock().await?;
        lock.lock_shared()?;
        let result = self.read_document().await;
        lock.unlock_async().await?;
        Ok(result?.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        debug!("Writing {key} into {:?}", self.path);
        let lock = self.open_lock().await?;
        lock.lock_exclusive()?;
        let result = self.update_document(key, value).await;
        lock.unlock_async().await?;
        result
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::storage::KeyValueStore;

    use super::FileKeyValueStore;

    #[tokio::test]
    async fn test_file_store_missing_file() -> Result<()> {
        let dir = tempdir()?;
        let store = FileKeyValueStore::new(dir.path().join("state.json"));

        assert_eq!(store.get("waterIntake").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_file_store_keeps_other_keys() -> Result<()> {
        let dir = tempdir()?;
        let store = FileKeyValueStore::new(dir.path().join("state.json"));

        store.set("waterIntake", "500".into()).await?;
        store.set("lastUpdated", "\"2018-07-04T00:00:00Z\"".into()).await?;
        store.set("waterIntake", "750".into()).await?;

        assert_eq!(store.get("waterIntake").await?.as_deref(), Some("750"));
        assert_eq!(
            store.get("lastUpdated").await?.as_deref(),
            Some("\"2018-07-04T00:00:00Z\"")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("state.json");

        FileKeyValueStore::new(path.clone())
            .set("waterIntake", "250".into())
            .await?;

        let reopened = FileKeyValueStore::new(path);
        assert_eq!(reopened.get("waterIntake").await?.as_deref(), Some("250"));
        Ok(())
    }

    #[tokio::test]
    async fn test_file_store_corrupted_document() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{\"waterIntake\": \"25")?;

        let store = FileKeyValueStore::new(path.clone());
        assert_eq!(store.get("waterIntake").await?, None);

        store.set("waterIntake", "1000".into()).await?;
        assert_eq!(store.get("waterIntake").await?.as_deref(), Some("1000"));

        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(raw["waterIntake"], "1000");
        Ok(())
    }

    #[tokio::test]
    async fn test_file_store_unwritable_location() -> Result<()> {
        let dir = tempdir()?;
        let store = FileKeyValueStore::new(dir.path().join("missing").join("state.json"));

        assert!(store.set("waterIntake", "250".into()).await.is_err());
        Ok(())
    }
}
