use std::{
    collections::HashMap,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::{Error, Result};

/// Blob storage for uploaded files. `key` is a relative, `/`-separated path; the returned
/// reference is what gets persisted next to the attachment metadata.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Bytes) -> Result<String>;

    async fn get(&self, reference: &str) -> Result<Bytes>;
}

/// Files under a root directory on the local disk.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let safe = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !safe || key.is_empty() {
            return Err(Error::invalid("file", "Invalid storage key."));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, bytes: Bytes) -> Result<String> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;
        debug!(key, size = bytes.len(), "stored object");
        Ok(key.to_string())
    }

    async fn get(&self, reference: &str) -> Result<Bytes> {
        let path = self.resolve(reference)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound("File")),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<HashMap<String, Bytes>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, bytes: Bytes) -> Result<String> {
        self.objects.write().await.insert(key.to_string(), bytes);
        Ok(key.to_string())
    }

    async fn get(&self, reference: &str) -> Result<Bytes> {
        self.objects
            .read()
            .await
            .get(reference)
            .cloned()
            .ok_or(Error::NotFound("File"))
    }
}

/// Reduces an uploaded file name to `[A-Za-z0-9._-]`, keeping the extension.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Lower-cased extension of a file name, if any.
pub fn file_extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_store_writes_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let reference = store
            .put("events/e1/documents/plan.pdf", Bytes::from_static(b"pdf"))
            .await
            .unwrap();
        assert_eq!(reference, "events/e1/documents/plan.pdf");
        assert!(dir.path().join("events/e1/documents/plan.pdf").exists());
        assert_eq!(store.get(&reference).await.unwrap(), Bytes::from_static(b"pdf"));
    }

    #[tokio::test]
    async fn test_local_store_refuses_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        assert!(store.put("../escape", Bytes::new()).await.is_err());
        assert!(store.put("/abs/path", Bytes::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryObjectStore::new();
        store.put("a/b.txt", Bytes::from_static(b"x")).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert!(matches!(store.get("missing").await, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_file_name_helpers() {
        assert_eq!(sanitize_file_name("../../etc/pass wd.txt"), "pass_wd.txt");
        assert_eq!(sanitize_file_name(".."), "upload");
        assert_eq!(file_extension("Photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(file_extension("noext"), None);
    }
}
