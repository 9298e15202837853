// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Object Store Port
//!
//! Upload-by-key storage for original images and their derivatives. The
//! store is an optional collaborator: pipelines treat a missing store as
//! "skip uploads and serve locally", never as an error. Failures surface as
//! network or external-service errors and the calling action decides
//! whether they are best-effort.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::ImportError;

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    /// Publicly resolvable URL of the stored object.
    pub url: String,
    pub size: u64,
    pub etag: Option<String>,
}

/// Upload-by-key object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads a local file under the given key.
    async fn upload_file(&self, local_path: &Path, key: &str) -> Result<StoredObject, ImportError>;

    /// Uploads an in-memory buffer under the given key.
    async fn upload_bytes(&self, bytes: Vec<u8>, key: &str) -> Result<StoredObject, ImportError>;

    /// The public URL an uploaded key is served from.
    fn public_url(&self, key: &str) -> String;

    /// A time-limited URL for private access to a key.
    async fn presigned_url(&self, key: &str, expires_in: Duration) -> Result<String, ImportError>;

    /// Reachability probe for the health monitor.
    async fn ping(&self) -> Result<(), ImportError>;
}
