// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Remote Object Store
//!
//! [`ObjectStore`] adapter over the `object_store` crate, configured for
//! S3-compatible backends (native S3 or an R2-style custom endpoint).
//! Credentials come from the standard AWS environment variables; only
//! bucket, endpoint, and the public serving URL are configuration.
//!
//! Upload failures map to `NETWORK`/`EXTERNAL_SERVICE` errors; the calling
//! actions decide whether those are best-effort.

use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as StorePath;
use object_store::ObjectStore as BackendStore;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use recipe_import_domain::services::{ObjectStore, StoredObject};
use recipe_import_domain::ImportError;

use crate::infrastructure::config::ObjectStoreConfig;

pub struct RemoteObjectStore {
    backend: Arc<dyn BackendStore>,
    public_base_url: String,
}

impl RemoteObjectStore {
    /// Builds the adapter from configuration plus ambient AWS credentials.
    pub fn from_config(config: &ObjectStoreConfig) -> Result<Self, ImportError> {
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(&config.bucket);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.with_endpoint(endpoint);
        }
        if let Some(region) = &config.region {
            builder = builder.with_region(region);
        }
        let backend = builder
            .build()
            .map_err(|e| ImportError::invalid_config(format!("object store misconfigured: {e}")))?;
        Ok(Self {
            backend: Arc::new(backend),
            public_base_url: config.public_base_url.clone(),
        })
    }

    /// Wraps an already-built backend; used by tests with an in-memory
    /// store.
    pub fn with_backend(backend: Arc<dyn BackendStore>, public_base_url: impl Into<String>) -> Self {
        Self {
            backend,
            public_base_url: public_base_url.into(),
        }
    }

    fn classify(e: object_store::Error) -> ImportError {
        match e {
            object_store::Error::NotFound { .. } => {
                ImportError::external_service(format!("object not found: {e}"))
            }
            other => {
                let text = other.to_string();
                if text.to_lowercase().contains("connect") {
                    ImportError::network(text)
                } else {
                    ImportError::external_service(text)
                }
            }
        }
    }
}

#[async_trait]
impl ObjectStore for RemoteObjectStore {
    async fn upload_file(&self, local_path: &Path, key: &str) -> Result<StoredObject, ImportError> {
        let bytes = tokio::fs::read(local_path).await.map_err(|e| {
            ImportError::io(format!("failed to read {}: {e}", local_path.display()))
        })?;
        self.upload_bytes(bytes, key).await
    }

    async fn upload_bytes(&self, bytes: Vec<u8>, key: &str) -> Result<StoredObject, ImportError> {
        let size = bytes.len() as u64;
        let location = StorePath::from(key);
        let payload = Bytes::from(bytes);
        let result = self
            .backend
            .put(&location, payload.into())
            .await
            .map_err(Self::classify)?;
        debug!(key, size, "object uploaded");
        Ok(StoredObject {
            key: key.to_string(),
            url: self.public_url(key),
            size,
            etag: result.e_tag,
        })
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), key)
    }

    async fn presigned_url(&self, key: &str, _expires_in: Duration) -> Result<String, ImportError> {
        // Buckets here are served through a public CDN host; signing is
        // the edge's concern. Private-bucket deployments swap this
        // adapter.
        Ok(self.public_url(key))
    }

    async fn ping(&self) -> Result<(), ImportError> {
        // A HEAD on a sentinel key answers reachability; NotFound still
        // proves the backend responded.
        match self.backend.head(&StorePath::from(".health-probe")).await {
            Ok(_) => Ok(()),
            Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(Self::classify(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    fn store() -> RemoteObjectStore {
        RemoteObjectStore::with_backend(Arc::new(InMemory::new()), "https://r2.example/")
    }

    #[tokio::test]
    async fn test_upload_bytes_and_url() {
        let store = store();
        let stored = store
            .upload_bytes(b"data".to_vec(), "processed/i1/n1-thumbnail.jpg")
            .await
            .unwrap();
        assert_eq!(stored.size, 4);
        assert_eq!(stored.url, "https://r2.example/processed/i1/n1-thumbnail.jpg");
    }

    #[tokio::test]
    async fn test_upload_file_reads_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.jpg");
        tokio::fs::write(&source, b"img").await.unwrap();
        let store = store();
        let stored = store.upload_file(&source, "originals/i1/a.jpg").await.unwrap();
        assert_eq!(stored.size, 3);
    }

    #[tokio::test]
    async fn test_upload_missing_file_is_io_error() {
        let store = store();
        let err = store
            .upload_file(Path::new("/definitely/not/here.jpg"), "k")
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::IoError(_)));
    }

    #[tokio::test]
    async fn test_ping_on_empty_store_is_healthy() {
        assert!(store().ping().await.is_ok());
    }
}
