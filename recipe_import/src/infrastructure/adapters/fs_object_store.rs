// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Filesystem Object Store
//!
//! [`ObjectStore`] implementation over a local directory, used for
//! development and tests: keys map to paths under the root, URLs to the
//! configured public base. Behaves like the remote store for every error
//! path that matters to the pipelines (missing parents, unwritable
//! targets).

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use recipe_import_domain::services::{ObjectStore, StoredObject};
use recipe_import_domain::ImportError;

pub struct FsObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    fn target_path(&self, key: &str) -> Result<PathBuf, ImportError> {
        if key.split('/').any(|part| part == "..") {
            return Err(ImportError::validation(format!("invalid object key: {key:?}")));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn upload_file(&self, local_path: &Path, key: &str) -> Result<StoredObject, ImportError> {
        let bytes = tokio::fs::read(local_path).await.map_err(|e| {
            ImportError::io(format!("failed to read {}: {e}", local_path.display()))
        })?;
        self.upload_bytes(bytes, key).await
    }

    async fn upload_bytes(&self, bytes: Vec<u8>, key: &str) -> Result<StoredObject, ImportError> {
        let target = self.target_path(key)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ImportError::external_service(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        let size = bytes.len() as u64;
        tokio::fs::write(&target, bytes).await.map_err(|e| {
            ImportError::external_service(format!("failed to write {}: {e}", target.display()))
        })?;
        debug!(key, size, "object stored on filesystem");
        Ok(StoredObject {
            key: key.to_string(),
            url: self.public_url(key),
            size,
            etag: None,
        })
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), key)
    }

    async fn presigned_url(&self, key: &str, _expires_in: Duration) -> Result<String, ImportError> {
        // Local serving has no signature scheme; the public URL stands in.
        Ok(self.public_url(key))
    }

    async fn ping(&self) -> Result<(), ImportError> {
        tokio::fs::metadata(&self.root).await.map_err(|e| {
            ImportError::external_service(format!(
                "object store root {} unavailable: {e}",
                self.root.display()
            ))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.jpg");
        tokio::fs::write(&source, b"jpeg bytes").await.unwrap();

        let store = FsObjectStore::new(dir.path().join("bucket"), "https://cdn.example");
        let stored = store.upload_file(&source, "originals/i1/a.jpg").await.unwrap();

        assert_eq!(stored.key, "originals/i1/a.jpg");
        assert_eq!(stored.url, "https://cdn.example/originals/i1/a.jpg");
        assert_eq!(stored.size, 10);
        let on_disk = tokio::fs::read(dir.path().join("bucket/originals/i1/a.jpg"))
            .await
            .unwrap();
        assert_eq!(on_disk, b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_upload_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path(), "https://cdn.example");
        assert!(store
            .upload_file(&dir.path().join("missing.jpg"), "k")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_traversal_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path(), "https://cdn.example");
        assert!(store.upload_bytes(vec![1], "../outside").await.is_err());
    }

    #[tokio::test]
    async fn test_ping_requires_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path().join("nope"), "https://cdn.example");
        assert!(store.ping().await.is_err());
    }
}
