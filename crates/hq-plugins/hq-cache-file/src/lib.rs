//! # hq-cache-file
//!
//! `LocalStore` persisted as one JSON object on disk, so the snapshot cache
//! survives restarts. The whole file is rewritten on every change.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use hq_core::LocalStore;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub struct FileLocalStore {
    file: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileLocalStore {
    /// Opens the store at `file`, creating parent directories as needed. An
    /// unreadable file starts the store empty.
    pub async fn open(file: impl AsRef<Path>) -> anyhow::Result<Self> {
        let file = file.as_ref().to_path_buf();
        if let Some(dir) = file.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await?;
        }
        let values = match fs::read(&file).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                warn!(path = %file.display(), error = %err, "local cache file is corrupt, starting empty");
                BTreeMap::new()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        debug!(path = %file.display(), keys = values.len(), "local cache opened");
        Ok(Self { file, values: Mutex::new(values) })
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    /// Writes to a sibling temp file and renames it over the target.
    async fn flush(&self, values: &BTreeMap<String, String>) -> anyhow::Result<()> {
        let bytes = serde_json::to_vec_pretty(values)?;
        let tmp = self.file.with_extension("tmp");
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, &self.file).await?;
        Ok(())
    }
}

#[async_trait]
impl LocalStore for FileLocalStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> anyhow::Result<()> {
        let mut values = self.values.lock().await;
        values.insert(key.to_string(), value);
        self.flush(&values).await
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        let mut values = self.values.lock().await;
        if values.remove(key).is_some() {
            self.flush(&values).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");

        let store = FileLocalStore::open(&path).await.unwrap();
        store.set("genshin-users", "[]".into()).await.unwrap();
        store.set("blog-current-user-id", "Sam".into()).await.unwrap();
        store.remove("blog-current-user-id").await.unwrap();
        drop(store);

        let reopened = FileLocalStore::open(&path).await.unwrap();
        assert_eq!(reopened.get("genshin-users").await.unwrap().as_deref(), Some("[]"));
        assert_eq!(reopened.get("blog-current-user-id").await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        tokio::fs::write(&path, b"{oops").await.unwrap();

        let store = FileLocalStore::open(&path).await.unwrap();
        assert_eq!(store.get("hsr-users").await.unwrap(), None);
        store.set("hsr-users", "[]".into()).await.unwrap();
        assert_eq!(store.get("hsr-users").await.unwrap().as_deref(), Some("[]"));
    }
}
