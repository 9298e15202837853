// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Shared fixtures for the integration suite: recording broadcaster,
//! fault-injecting object store, dependency-bundle builder over in-memory
//! infrastructure, and test image generation.

// Each integration binary compiles this module independently and uses a
// different subset of it.
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use recipe_import::application::pipeline::{QueueSet, WorkerDeps};
use recipe_import::application::services::{CompletionTracker, ErrorHandler};
use recipe_import::infrastructure::adapters::{
    DerivativeGenerator, FsObjectStore, HeuristicNoteParser,
};
use recipe_import::infrastructure::metrics::MetricsService;
use recipe_import::infrastructure::queue::InMemoryJobQueue;
use recipe_import::infrastructure::repositories::{
    connect, ensure_schema, SqliteImageRepository, SqliteNoteRepository,
};
use recipe_import::AppConfig;
use recipe_import_domain::services::{ObjectStore, StatusBroadcaster, StoredObject};
use recipe_import_domain::{ImportError, QueueName, StatusEvent};

/// Broadcaster that records every emitted event.
pub struct RecordingBroadcaster {
    events: Mutex<Vec<StatusEvent>>,
}

impl RecordingBroadcaster {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl StatusBroadcaster for RecordingBroadcaster {
    async fn emit(&self, event: StatusEvent) -> Result<(), ImportError> {
        self.events.lock().push(event);
        Ok(())
    }
}

/// Object store decorator that fails uploads whose key contains any of
/// the configured fragments.
pub struct FailingObjectStore {
    inner: FsObjectStore,
    fail_key_fragments: Vec<String>,
    fail_all: bool,
    pub attempted_keys: Mutex<Vec<String>>,
}

impl FailingObjectStore {
    pub fn failing_on(root: impl Into<PathBuf>, fragments: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            inner: FsObjectStore::new(root, "https://r2.example"),
            fail_key_fragments: fragments.iter().map(|s| s.to_string()).collect(),
            fail_all: false,
            attempted_keys: Mutex::new(Vec::new()),
        })
    }

    pub fn failing_everything(root: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            inner: FsObjectStore::new(root, "https://r2.example"),
            fail_key_fragments: Vec::new(),
            fail_all: true,
            attempted_keys: Mutex::new(Vec::new()),
        })
    }

    fn should_fail(&self, key: &str) -> bool {
        self.fail_all || self.fail_key_fragments.iter().any(|f| key.contains(f))
    }
}

#[async_trait]
impl ObjectStore for FailingObjectStore {
    async fn upload_file(&self, local_path: &Path, key: &str) -> Result<StoredObject, ImportError> {
        self.attempted_keys.lock().push(key.to_string());
        if self.should_fail(key) {
            return Err(ImportError::network(format!("injected failure for {key}")));
        }
        self.inner.upload_file(local_path, key).await
    }

    async fn upload_bytes(&self, bytes: Vec<u8>, key: &str) -> Result<StoredObject, ImportError> {
        self.attempted_keys.lock().push(key.to_string());
        if self.should_fail(key) {
            return Err(ImportError::network(format!("injected failure for {key}")));
        }
        self.inner.upload_bytes(bytes, key).await
    }

    fn public_url(&self, key: &str) -> String {
        self.inner.public_url(key)
    }

    async fn presigned_url(&self, key: &str, expires_in: Duration) -> Result<String, ImportError> {
        self.inner.presigned_url(key, expires_in).await
    }

    async fn ping(&self) -> Result<(), ImportError> {
        Ok(())
    }
}

/// Builder for a fully in-memory dependency bundle with injectable
/// collaborators.
pub struct DepsBuilder {
    config: AppConfig,
    object_store: Option<Arc<dyn ObjectStore>>,
    broadcaster: Option<Arc<dyn StatusBroadcaster>>,
}

impl DepsBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig {
                database_path: ":memory:".to_string(),
                image_base_url: "http://localhost:4200".to_string(),
                ..AppConfig::default()
            },
            object_store: None,
            broadcaster: None,
        }
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_object_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.object_store = Some(store);
        self
    }

    pub fn with_broadcaster(mut self, broadcaster: Arc<dyn StatusBroadcaster>) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    pub async fn build(self) -> WorkerDeps {
        let pool = connect(":memory:").await.expect("in-memory database");
        ensure_schema(&pool).await.expect("schema");

        let completion = Arc::new(CompletionTracker::new());
        if let Some(broadcaster) = &self.broadcaster {
            completion.bind_broadcaster(Arc::clone(broadcaster));
        }

        let queues = QueueSet {
            notes: Arc::new(InMemoryJobQueue::new(QueueName::Notes)),
            ingredients: Arc::new(InMemoryJobQueue::new(QueueName::Ingredients)),
            instruction: Arc::new(InMemoryJobQueue::new(QueueName::Instruction)),
            image: Arc::new(InMemoryJobQueue::new(QueueName::Image)),
            categorization: Arc::new(InMemoryJobQueue::new(QueueName::Categorization)),
            source: Arc::new(InMemoryJobQueue::new(QueueName::Source)),
        };

        WorkerDeps::new(
            Arc::new(self.config.clone()),
            Arc::new(SqliteNoteRepository::new(pool.clone())),
            Arc::new(SqliteImageRepository::new(pool)),
            self.object_store,
            Arc::new(RwLock::new(self.broadcaster)),
            Arc::new(DerivativeGenerator::new()),
            Arc::new(HeuristicNoteParser::new()),
            completion,
            Arc::new(ErrorHandler::new(self.config.retry_policy())),
            queues,
            Arc::new(MetricsService::new().expect("metrics")),
        )
    }
}

impl Default for DepsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes a small valid JPEG test image and returns its path.
pub fn write_test_image(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
    let path = dir.join(name);
    let img =
        image::RgbImage::from_fn(w, h, |x, y| image::Rgb([(x % 251) as u8, (y % 241) as u8, 90]));
    img.save(&path).expect("test image");
    path
}

/// Polls a condition until it holds or the timeout elapses.
pub async fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

/// Distinct keys attempted against a failing store.
pub fn distinct_keys(store: &FailingObjectStore) -> HashSet<String> {
    store.attempted_keys.lock().iter().cloned().collect()
}
