// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Shared fixtures for unit tests: an in-memory dependency bundle, a
//! recording broadcaster, and a recording pipeline observer.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;

use recipe_import_domain::services::StatusBroadcaster;
use recipe_import_domain::{ActionContext, ActionName, ImportError, QueueName, StatusEvent};

use crate::application::pipeline::{PipelineObserver, QueueSet, WorkerDeps};
use crate::application::services::completion_tracker::CompletionTracker;
use crate::application::services::error_handler::ErrorHandler;
use crate::infrastructure::adapters::{DerivativeGenerator, HeuristicNoteParser};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::metrics::MetricsService;
use crate::infrastructure::queue::InMemoryJobQueue;
use crate::infrastructure::repositories::{
    connect, ensure_schema, SqliteImageRepository, SqliteNoteRepository,
};

/// Broadcaster that records every emitted event.
pub struct RecordingBroadcaster {
    events: Mutex<Vec<StatusEvent>>,
}

impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.lock().clone()
    }
}

impl Default for RecordingBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl StatusBroadcaster for RecordingBroadcaster {
    async fn emit(&self, event: StatusEvent) -> Result<(), ImportError> {
        self.events.lock().push(event);
        Ok(())
    }
}

/// Pipeline lifecycle events captured by the recording observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordedEvent {
    Started(ActionName),
    Completed(ActionName),
}

struct RecordingObserver {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl PipelineObserver for RecordingObserver {
    fn on_action_started(&self, _ctx: &ActionContext, action: ActionName) {
        self.events.lock().push(RecordedEvent::Started(action));
    }

    fn on_action_completed(&self, _ctx: &ActionContext, action: ActionName, _elapsed: Duration) {
        self.events.lock().push(RecordedEvent::Completed(action));
    }
}

/// An observer plus the shared log it writes into.
pub fn recording_observer() -> (Arc<dyn PipelineObserver>, Arc<Mutex<Vec<RecordedEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    (
        Arc::new(RecordingObserver {
            events: Arc::clone(&events),
        }),
        events,
    )
}

/// A fresh in-memory queue set.
pub fn test_queues() -> QueueSet {
    QueueSet {
        notes: Arc::new(InMemoryJobQueue::new(QueueName::Notes)),
        ingredients: Arc::new(InMemoryJobQueue::new(QueueName::Ingredients)),
        instruction: Arc::new(InMemoryJobQueue::new(QueueName::Instruction)),
        image: Arc::new(InMemoryJobQueue::new(QueueName::Image)),
        categorization: Arc::new(InMemoryJobQueue::new(QueueName::Categorization)),
        source: Arc::new(InMemoryJobQueue::new(QueueName::Source)),
    }
}

/// A fully in-memory dependency bundle: sqlite `:memory:` repositories,
/// no object store, no broadcaster bound, real derivative generator and
/// note parser.
pub async fn test_deps() -> WorkerDeps {
    test_deps_with_config(AppConfig {
        database_path: ":memory:".to_string(),
        ..AppConfig::default()
    })
    .await
}

/// Like [`test_deps`] but with a caller-supplied configuration.
pub async fn test_deps_with_config(config: AppConfig) -> WorkerDeps {
    let pool = connect(":memory:").await.expect("in-memory database");
    ensure_schema(&pool).await.expect("schema");

    WorkerDeps::new(
        Arc::new(config),
        Arc::new(SqliteNoteRepository::new(pool.clone())),
        Arc::new(SqliteImageRepository::new(pool)),
        None,
        Arc::new(RwLock::new(None)),
        Arc::new(DerivativeGenerator::new()),
        Arc::new(HeuristicNoteParser::new()),
        Arc::new(CompletionTracker::new()),
        Arc::new(ErrorHandler::default()),
        test_queues(),
        Arc::new(MetricsService::new().expect("metrics")),
    )
}
