//! Document blob storage.
//!
//! Upload handling goes through the [`DocumentStore`] trait. The local
//! filesystem implementation backs development and self-hosted deploys;
//! the upload-url flow hands clients a PUT target served by this API.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::instrument;

use crate::errors::ServiceError;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persists the bytes under the given key, overwriting any prior object.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ServiceError>;

    /// Fetches the object, or `None` if the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ServiceError>;

    /// URL a client should PUT the object body to.
    fn upload_url(&self, base_url: &str, key: &str) -> String;
}

/// Stores documents as files under a local directory.
pub struct LocalDocumentStore {
    root: PathBuf,
}

impl LocalDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Rejects keys that could escape the storage root.
    fn resolve(&self, key: &str) -> Result<PathBuf, ServiceError> {
        if key.is_empty()
            || key.starts_with('/')
            || key.split('/').any(|part| part == ".." || part == ".")
        {
            return Err(ServiceError::InvalidInput(format!(
                "Invalid document key: {}",
                key
            )));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ServiceError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ServiceError::InternalError(format!("Failed to create upload dir: {}", e))
            })?;
        }

        let mut file = tokio::fs::File::create(&path).await.map_err(|e| {
            ServiceError::InternalError(format!("Failed to create document file: {}", e))
        })?;
        file.write_all(bytes).await.map_err(|e| {
            ServiceError::InternalError(format!("Failed to write document: {}", e))
        })?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ServiceError> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ServiceError::InternalError(format!(
                "Failed to read document: {}",
                e
            ))),
        }
    }

    fn upload_url(&self, base_url: &str, key: &str) -> String {
        format!("{}/api/v1/funnel/upload/{}", base_url.trim_end_matches('/'), key)
    }
}

/// Builds the stored key for a funnel upload. The uuid prefix keeps
/// repeated uploads of the same file name from colliding.
pub fn document_key(session_id: &str, file_name: &str) -> String {
    let safe_name: String = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("uploads/{}/{}-{}", session_id, uuid::Uuid::new_v4(), safe_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn put_then_get_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = LocalDocumentStore::new(dir.path());

        store.put("sess/bill/june.pdf", b"hello").await.unwrap();
        let bytes = store.get("sess/bill/june.pdf").await.unwrap().unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[tokio::test]
    async fn missing_key_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = LocalDocumentStore::new(dir.path());
        assert!(store.get("nope/missing.pdf").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let store = LocalDocumentStore::new(dir.path());

        assert!(store.put("../escape.txt", b"x").await.is_err());
        assert!(store.put("/abs/path.txt", b"x").await.is_err());
        assert!(store.get("a/../../b").await.is_err());
    }

    #[test]
    fn document_keys_are_sanitized() {
        let key = document_key("fs_1", "june bill (1).pdf");
        assert!(key.starts_with("uploads/fs_1/"));
        assert!(key.ends_with("-june_bill__1_.pdf"));

        let sneaky = document_key("fs_1", "../../etc/passwd");
        assert!(sneaky.ends_with("-passwd"));
        assert!(!sneaky.contains(".."));
    }
}
