// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Worker Dependency Bundle
//!
//! The shared collaborators injected into every action of a worker's
//! pipeline. Constructed once per worker from the service container; cheap
//! to clone (everything inside is an `Arc`). Actions receive the bundle by
//! shared reference and never mutate it - the one deliberate exception is
//! the late-bound broadcaster slot, which the container may populate after
//! workers are already running.

use parking_lot::RwLock;
use std::sync::Arc;

use recipe_import_domain::jobs::{
    CategorizationJobData, ImageJobData, IngredientJobData, InstructionJobData, NoteJobData,
    SourceJobData,
};
use recipe_import_domain::repositories::{ImageRepository, NoteRepository};
use recipe_import_domain::services::{
    ImageProcessor, JobQueue, NoteParser, ObjectStore, StatusBroadcaster,
};

use crate::application::services::completion_tracker::CompletionTracker;
use crate::application::services::error_handler::ErrorHandler;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::metrics::MetricsService;

/// Shared slot for the optionally late-bound broadcaster.
pub type BroadcasterSlot = Arc<RwLock<Option<Arc<dyn StatusBroadcaster>>>>;

/// Typed handles to every queue, used by fan-out actions and the worker
/// factory. Cross-queue edges in the pipelines go through these handles
/// only.
#[derive(Clone)]
pub struct QueueSet {
    pub notes: Arc<dyn JobQueue<NoteJobData>>,
    pub ingredients: Arc<dyn JobQueue<IngredientJobData>>,
    pub instruction: Arc<dyn JobQueue<InstructionJobData>>,
    pub image: Arc<dyn JobQueue<ImageJobData>>,
    pub categorization: Arc<dyn JobQueue<CategorizationJobData>>,
    pub source: Arc<dyn JobQueue<SourceJobData>>,
}

/// The dependency bundle handed to every action.
#[derive(Clone)]
pub struct WorkerDeps {
    pub config: Arc<AppConfig>,
    pub notes: Arc<dyn NoteRepository>,
    pub images: Arc<dyn ImageRepository>,
    /// Absent when no object store is configured; pipelines then skip
    /// uploads and record locally served URLs.
    pub object_store: Option<Arc<dyn ObjectStore>>,
    broadcaster: BroadcasterSlot,
    pub image_processor: Arc<dyn ImageProcessor>,
    pub note_parser: Arc<dyn NoteParser>,
    pub completion: Arc<CompletionTracker>,
    pub error_handler: Arc<ErrorHandler>,
    pub queues: QueueSet,
    pub metrics: Arc<MetricsService>,
}

impl WorkerDeps {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<AppConfig>,
        notes: Arc<dyn NoteRepository>,
        images: Arc<dyn ImageRepository>,
        object_store: Option<Arc<dyn ObjectStore>>,
        broadcaster: BroadcasterSlot,
        image_processor: Arc<dyn ImageProcessor>,
        note_parser: Arc<dyn NoteParser>,
        completion: Arc<CompletionTracker>,
        error_handler: Arc<ErrorHandler>,
        queues: QueueSet,
        metrics: Arc<MetricsService>,
    ) -> Self {
        Self {
            config,
            notes,
            images,
            object_store,
            broadcaster,
            image_processor,
            note_parser,
            completion,
            error_handler,
            queues,
            metrics,
        }
    }

    /// The currently bound broadcaster, if any.
    ///
    /// Reads the shared slot so workers observe a broadcaster bound after
    /// they started.
    pub fn broadcaster(&self) -> Option<Arc<dyn StatusBroadcaster>> {
        self.broadcaster.read().clone()
    }
}
