use super::{BatchOp, KvStore, WriteBatch};
use crate::error::Result;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Key-value store backed by a single JSON object on disk.
///
/// The whole map is kept in memory and the file is rewritten on every change
/// (temp file + rename), so a crash leaves either the old or the new file,
/// never a torn one. Batches are committed with a single rewrite.
pub struct FileStore {
    path: PathBuf,
    pretty: bool,
    data: RefCell<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store; it is
    /// created on the first write.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = match fs::read_to_string(&path).await {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        log::debug!("opened {} with {} keys", path.display(), data.len());
        Ok(Self {
            path,
            pretty: true,
            data: RefCell::new(data),
        })
    }

    pub fn with_pretty_json(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy of the map, persist it, then swap it in.
    /// The in-memory map only changes once the file has been replaced.
    async fn commit<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut next = self.data.borrow().clone();
        change(&mut next);
        self.persist(&next).await?;
        *self.data.borrow_mut() = next;
        Ok(())
    }

    async fn persist(&self, data: &BTreeMap<String, String>) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).await?;

        let content = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store".to_string());
        let tmp_file = dir.join(format!(".{}-{}.tmp", file_name, Uuid::new_v4()));
        fs::write(&tmp_file, content).await?;
        if let Err(err) = fs::rename(&tmp_file, &self.path).await {
            let _ = fs::remove_file(&tmp_file).await;
            return Err(err.into());
        }
        Ok(())
    }
}

impl KvStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.borrow().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.commit(|data| {
            data.insert(key.to_string(), value.to_string());
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        if !self.data.borrow().contains_key(key) {
            return Ok(());
        }
        self.commit(|data| {
            data.remove(key);
        })
        .await
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.data.borrow().keys().cloned().collect())
    }

    async fn clear(&self) -> Result<()> {
        self.commit(|data| data.clear()).await
    }

    async fn apply(&self, batch: &WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.commit(|data| {
            for op in batch.ops() {
                match op {
                    BatchOp::Set { key, value } => {
                        data.insert(key.clone(), value.clone());
                    }
                    BatchOp::Remove { key } => {
                        data.remove(key);
                    }
                }
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("notes.json")).await.unwrap();
        assert!(store.list_keys().await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn creates_parent_directories_on_first_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("notes.json");
        let store = FileStore::open(&path).await.unwrap();
        store.set("note_1", "hi").await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = FileStore::open(&path).await.err().unwrap();
        assert!(matches!(err, crate::error::NotesError::Serialization(_)));
    }

    #[tokio::test]
    async fn compact_json_when_not_pretty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        let store = FileStore::open(&path)
            .await
            .unwrap()
            .with_pretty_json(false);
        store.set("a", "1").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"{"a":"1"}"#);
    }
}
