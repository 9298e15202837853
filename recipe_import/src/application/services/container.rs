// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Service Container
//!
//! The process-wide composition root. Constructed once; owns the
//! lifetimes of every shared collaborator - the database pool and
//! repositories, the six queues, the optional object store, the
//! broadcaster (a late-bindable slot fed by the in-process channel), the
//! health monitor, error handler, completion tracker, and metrics.
//! Components receive the container's contents by `Arc` and never close
//! anything themselves.
//!
//! `close` tears down owned resources with settle-all semantics: every
//! queue is closed regardless of sibling failures, failures are logged,
//! and the call resolves only when everything has settled.

use parking_lot::{Mutex, RwLock};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{error, info};

use recipe_import_bootstrap::ShutdownCoordinator;
use recipe_import_domain::repositories::{ImageRepository, NoteRepository};
use recipe_import_domain::services::{
    HealthProbe, ImageProcessor, NoteParser, ObjectStore, StatusBroadcaster,
};
use recipe_import_domain::{ImportError, QueueName};

use crate::application::pipeline::{BroadcasterSlot, QueueSet, WorkerDeps};
use crate::application::services::completion_tracker::CompletionTracker;
use crate::application::services::error_handler::ErrorHandler;
use crate::application::services::health::{HealthMonitor, ObjectStoreProbe, QueuePingProbe};
use crate::infrastructure::adapters::{DerivativeGenerator, HeuristicNoteParser, RemoteObjectStore};
use crate::infrastructure::broadcast::{ChannelBroadcaster, WsBroadcastServer};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::metrics::MetricsService;
use crate::infrastructure::queue::InMemoryJobQueue;
use crate::infrastructure::repositories::{
    connect, ensure_schema, DatabaseProbe, SqliteImageRepository, SqliteNoteRepository,
};

pub struct ServiceContainer {
    config: Arc<AppConfig>,
    pool: SqlitePool,
    notes: Arc<dyn NoteRepository>,
    images: Arc<dyn ImageRepository>,
    queues: QueueSet,
    object_store: Option<Arc<dyn ObjectStore>>,
    broadcaster_slot: BroadcasterSlot,
    channel_broadcaster: Arc<ChannelBroadcaster>,
    completion: Arc<CompletionTracker>,
    error_handler: Arc<ErrorHandler>,
    health: Arc<HealthMonitor>,
    metrics: Arc<MetricsService>,
    image_processor: Arc<dyn ImageProcessor>,
    note_parser: Arc<dyn NoteParser>,
    shutdown: ShutdownCoordinator,
    ws_server: Mutex<Option<WsBroadcastServer>>,
}

impl ServiceContainer {
    /// Composes the whole process from configuration.
    pub async fn build(config: AppConfig) -> Result<Arc<Self>, ImportError> {
        let config = Arc::new(config);
        let shutdown =
            ShutdownCoordinator::new(std::time::Duration::from_secs(config.shutdown_grace_secs));

        let pool = connect(&config.database_path).await?;
        ensure_schema(&pool).await?;
        let notes: Arc<dyn NoteRepository> = Arc::new(SqliteNoteRepository::new(pool.clone()));
        let images: Arc<dyn ImageRepository> = Arc::new(SqliteImageRepository::new(pool.clone()));

        let batch = config.batch_size;
        let queues = QueueSet {
            notes: Arc::new(InMemoryJobQueue::with_batch_size(QueueName::Notes, batch)),
            ingredients: Arc::new(InMemoryJobQueue::with_batch_size(QueueName::Ingredients, batch)),
            instruction: Arc::new(InMemoryJobQueue::with_batch_size(QueueName::Instruction, batch)),
            image: Arc::new(InMemoryJobQueue::with_batch_size(QueueName::Image, batch)),
            categorization: Arc::new(InMemoryJobQueue::with_batch_size(
                QueueName::Categorization,
                batch,
            )),
            source: Arc::new(InMemoryJobQueue::with_batch_size(QueueName::Source, batch)),
        };

        let object_store: Option<Arc<dyn ObjectStore>> = match &config.object_store {
            Some(store_config) => {
                let store = RemoteObjectStore::from_config(store_config)?;
                info!(bucket = %store_config.bucket, "object store configured");
                Some(Arc::new(store))
            }
            None => {
                info!("no object store configured; images will be served locally");
                None
            }
        };

        let channel_broadcaster = Arc::new(ChannelBroadcaster::new());
        let broadcaster_slot: BroadcasterSlot = Arc::new(RwLock::new(Some(
            Arc::clone(&channel_broadcaster) as Arc<dyn StatusBroadcaster>,
        )));

        let completion = Arc::new(CompletionTracker::new());
        completion.bind_broadcaster(Arc::clone(&channel_broadcaster) as Arc<dyn StatusBroadcaster>);
        completion.bind_followup_queue(Arc::clone(&queues.categorization));

        let error_handler = Arc::new(ErrorHandler::new(config.retry_policy()));

        let mut probes: Vec<Arc<dyn HealthProbe>> = vec![
            Arc::new(DatabaseProbe::new(pool.clone())),
            Arc::new(QueuePingProbe::new(Arc::clone(&queues.notes))),
            Arc::new(QueuePingProbe::new(Arc::clone(&queues.image))),
        ];
        if let Some(store) = &object_store {
            probes.push(Arc::new(ObjectStoreProbe::new(Arc::clone(store))));
        }
        let health = Arc::new(HealthMonitor::new(probes));

        let metrics = Arc::new(MetricsService::new()?);

        Ok(Arc::new(Self {
            config,
            pool,
            notes,
            images,
            queues,
            object_store,
            broadcaster_slot,
            channel_broadcaster,
            completion,
            error_handler,
            health,
            metrics,
            image_processor: Arc::new(DerivativeGenerator::new()),
            note_parser: Arc::new(HeuristicNoteParser::new()),
            shutdown,
            ws_server: Mutex::new(None),
        }))
    }

    /// The dependency bundle a worker injects into its actions.
    pub fn worker_deps(&self) -> WorkerDeps {
        WorkerDeps::new(
            Arc::clone(&self.config),
            Arc::clone(&self.notes),
            Arc::clone(&self.images),
            self.object_store.clone(),
            Arc::clone(&self.broadcaster_slot),
            Arc::clone(&self.image_processor),
            Arc::clone(&self.note_parser),
            Arc::clone(&self.completion),
            Arc::clone(&self.error_handler),
            self.queues.clone(),
            Arc::clone(&self.metrics),
        )
    }

    /// Starts the WebSocket fan-out of the status stream on the
    /// configured port.
    pub async fn start_ws_broadcaster(&self) -> Result<(), ImportError> {
        let addr: std::net::SocketAddr = format!("0.0.0.0:{}", self.config.ws_port)
            .parse()
            .map_err(|e| ImportError::invalid_config(format!("invalid ws_port: {e}")))?;
        let server = WsBroadcastServer::spawn(
            addr,
            Arc::clone(&self.channel_broadcaster),
            self.shutdown.token(),
        )
        .await?;
        *self.ws_server.lock() = Some(server);
        Ok(())
    }

    /// Replaces the broadcaster every live worker observes. Used by tests
    /// and by deployments wiring an external sink after startup.
    pub fn bind_broadcaster(&self, broadcaster: Arc<dyn StatusBroadcaster>) {
        self.completion.bind_broadcaster(Arc::clone(&broadcaster));
        *self.broadcaster_slot.write() = Some(broadcaster);
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn queues(&self) -> &QueueSet {
        &self.queues
    }

    pub fn completion(&self) -> &Arc<CompletionTracker> {
        &self.completion
    }

    pub fn error_handler(&self) -> &Arc<ErrorHandler> {
        &self.error_handler
    }

    pub fn health(&self) -> &Arc<HealthMonitor> {
        &self.health
    }

    pub fn metrics(&self) -> &Arc<MetricsService> {
        &self.metrics
    }

    pub fn shutdown(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    pub fn channel_broadcaster(&self) -> &Arc<ChannelBroadcaster> {
        &self.channel_broadcaster
    }

    pub fn notes_repository(&self) -> &Arc<dyn NoteRepository> {
        &self.notes
    }

    pub fn images_repository(&self) -> &Arc<dyn ImageRepository> {
        &self.images
    }

    /// Per-queue depth snapshot for status output.
    pub fn queue_depths(&self) -> Vec<(QueueName, usize)> {
        vec![
            (QueueName::Notes, self.queues.notes.depth()),
            (QueueName::Ingredients, self.queues.ingredients.depth()),
            (QueueName::Instruction, self.queues.instruction.depth()),
            (QueueName::Image, self.queues.image.depth()),
            (QueueName::Categorization, self.queues.categorization.depth()),
            (QueueName::Source, self.queues.source.depth()),
        ]
    }

    /// Tears down every owned resource. Settle-all: a failure in one
    /// teardown never skips the others; failures are logged. The database
    /// pool disconnect runs last.
    pub async fn close(&self) -> Result<(), ImportError> {
        let closes: Vec<(&str, Result<(), ImportError>)> = vec![
            ("notes", self.queues.notes.close().await),
            ("ingredients", self.queues.ingredients.close().await),
            ("instruction", self.queues.instruction.close().await),
            ("image", self.queues.image.close().await),
            ("categorization", self.queues.categorization.close().await),
            ("source", self.queues.source.close().await),
        ];
        for (queue, result) in closes {
            if let Err(e) = result {
                error!(queue, error = %e, "queue close failed");
            }
        }

        let ws_server = self.ws_server.lock().take();
        if let Some(server) = ws_server {
            server.shutdown().await;
        }

        self.pool.close().await;
        info!("service container closed");
        Ok(())
    }
}
