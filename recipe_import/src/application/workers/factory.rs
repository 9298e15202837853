// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Worker Factory
//!
//! Constructs the full worker set from the service container: one worker
//! per queue, each with its own action factory (registered before the
//! first job), its own pipeline builder, and the shared dependency
//! bundle. Construction failures abort the whole build - a platform with
//! a missing pipeline is not allowed to start.
//!
//! Workers are returned in fixed start order (the notes worker first, so
//! fan-out targets are consuming before the first note completes -
//! matching [`QueueName::ALL`]).

use std::sync::Arc;

use recipe_import_domain::jobs::{
    CategorizationJobData, ImageJobData, IngredientJobData, InstructionJobData, NoteJobData,
    SourceJobData,
};
use recipe_import_domain::services::JobQueue;
use recipe_import_domain::{ActionName, ImportError, QueueName};

use crate::application::actions::categorization::register_categorization_actions;
use crate::application::actions::image::{register_image_actions, ImageFailedStatus};
use crate::application::actions::ingredients::register_ingredient_actions;
use crate::application::actions::instructions::register_instruction_actions;
use crate::application::actions::notes::register_note_actions;
use crate::application::actions::source::register_source_actions;
use crate::application::pipeline::{ActionFactory, PipelineObserver, PipelineRuntime};
use crate::application::services::container::ServiceContainer;
use crate::application::workers::base_worker::{BaseWorker, ManagedWorker, PipelineBuilder};

pub struct WorkerFactory {
    container: Arc<ServiceContainer>,
}

impl WorkerFactory {
    pub fn new(container: Arc<ServiceContainer>) -> Self {
        Self { container }
    }

    /// Builds all six workers in start order.
    pub fn build_all(&self) -> Result<Vec<Arc<dyn ManagedWorker>>, ImportError> {
        Ok(vec![
            self.build_notes_worker()?,
            self.build_ingredients_worker()?,
            self.build_instruction_worker()?,
            self.build_image_worker()?,
            self.build_categorization_worker()?,
            self.build_source_worker()?,
        ])
    }

    fn runtime<D>(&self) -> PipelineRuntime<D>
    where
        D: Send + 'static,
    {
        PipelineRuntime::new()
            .with_observer(Arc::clone(self.container.metrics()) as Arc<dyn PipelineObserver>)
    }

    /// A builder that instantiates a fixed action sequence from the
    /// worker's factory.
    fn sequence_builder<D>(sequence: &'static [ActionName]) -> PipelineBuilder<D>
    where
        D: Send + 'static,
    {
        Arc::new(move |_data, _ctx, factory, deps| {
            sequence.iter().map(|name| factory.create(*name, deps)).collect()
        })
    }

    fn build_notes_worker(&self) -> Result<Arc<dyn ManagedWorker>, ImportError> {
        const PIPELINE: &[ActionName] = &[ActionName::SaveNote, ActionName::FanOutNote];
        let factory = Arc::new(ActionFactory::<NoteJobData>::new());
        register_note_actions(&factory)?;
        Ok(Arc::new(BaseWorker::new(
            "notes-worker",
            "note_import",
            Arc::clone(&self.container.queues().notes) as Arc<dyn JobQueue<NoteJobData>>,
            self.container.worker_deps(),
            factory,
            Self::sequence_builder(PIPELINE),
            self.runtime(),
            Arc::clone(self.container.health()),
            self.container.shutdown().clone(),
            self.container.config().concurrency_for(QueueName::Notes),
        )))
    }

    fn build_ingredients_worker(&self) -> Result<Arc<dyn ManagedWorker>, ImportError> {
        const PIPELINE: &[ActionName] = &[
            ActionName::ParseIngredient,
            ActionName::IngredientCompletedStatus,
        ];
        let factory = Arc::new(ActionFactory::<IngredientJobData>::new());
        register_ingredient_actions(&factory)?;
        Ok(Arc::new(BaseWorker::new(
            "ingredients-worker",
            "ingredient_processing",
            Arc::clone(&self.container.queues().ingredients)
                as Arc<dyn JobQueue<IngredientJobData>>,
            self.container.worker_deps(),
            factory,
            Self::sequence_builder(PIPELINE),
            self.runtime(),
            Arc::clone(self.container.health()),
            self.container.shutdown().clone(),
            self.container.config().concurrency_for(QueueName::Ingredients),
        )))
    }

    fn build_instruction_worker(&self) -> Result<Arc<dyn ManagedWorker>, ImportError> {
        const PIPELINE: &[ActionName] = &[
            ActionName::FormatInstruction,
            ActionName::InstructionCompletedStatus,
        ];
        let factory = Arc::new(ActionFactory::<InstructionJobData>::new());
        register_instruction_actions(&factory)?;
        Ok(Arc::new(BaseWorker::new(
            "instruction-worker",
            "instruction_processing",
            Arc::clone(&self.container.queues().instruction)
                as Arc<dyn JobQueue<InstructionJobData>>,
            self.container.worker_deps(),
            factory,
            Self::sequence_builder(PIPELINE),
            self.runtime(),
            Arc::clone(self.container.health()),
            self.container.shutdown().clone(),
            self.container.config().concurrency_for(QueueName::Instruction),
        )))
    }

    fn build_image_worker(&self) -> Result<Arc<dyn ManagedWorker>, ImportError> {
        let factory = Arc::new(ActionFactory::<ImageJobData>::new());
        register_image_actions(&factory)?;
        let worker = BaseWorker::new(
            "image-worker",
            "image_processing",
            Arc::clone(&self.container.queues().image) as Arc<dyn JobQueue<ImageJobData>>,
            self.container.worker_deps(),
            factory,
            Self::sequence_builder(&ActionName::IMAGE_PIPELINE),
            self.runtime(),
            Arc::clone(self.container.health()),
            self.container.shutdown().clone(),
            self.container.config().concurrency_for(QueueName::Image),
        )
        .with_failure_handler(Arc::new(ImageFailedStatus));
        Ok(Arc::new(worker))
    }

    fn build_categorization_worker(&self) -> Result<Arc<dyn ManagedWorker>, ImportError> {
        const PIPELINE: &[ActionName] = &[ActionName::CategorizeNote];
        let factory = Arc::new(ActionFactory::<CategorizationJobData>::new());
        register_categorization_actions(&factory)?;
        Ok(Arc::new(BaseWorker::new(
            "categorization-worker",
            "categorization",
            Arc::clone(&self.container.queues().categorization)
                as Arc<dyn JobQueue<CategorizationJobData>>,
            self.container.worker_deps(),
            factory,
            Self::sequence_builder(PIPELINE),
            self.runtime(),
            Arc::clone(self.container.health()),
            self.container.shutdown().clone(),
            self.container.config().concurrency_for(QueueName::Categorization),
        )))
    }

    fn build_source_worker(&self) -> Result<Arc<dyn ManagedWorker>, ImportError> {
        const PIPELINE: &[ActionName] = &[ActionName::ProcessSource];
        let factory = Arc::new(ActionFactory::<SourceJobData>::new());
        register_source_actions(&factory)?;
        Ok(Arc::new(BaseWorker::new(
            "source-worker",
            "source_import",
            Arc::clone(&self.container.queues().source) as Arc<dyn JobQueue<SourceJobData>>,
            self.container.worker_deps(),
            factory,
            Self::sequence_builder(PIPELINE),
            self.runtime(),
            Arc::clone(self.container.health()),
            self.container.shutdown().clone(),
            self.container.config().concurrency_for(QueueName::Source),
        )))
    }
}
