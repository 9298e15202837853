// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Notes Pipeline Actions
//!
//! The entry pipeline of the platform: parse the incoming HTML blob,
//! persist the note, then fan the note out into its downstream jobs. The
//! note is saved before any fan-out job is enqueued, so every downstream
//! worker can rely on the record existing.
//!
//! ## Fan-Out Accounting
//!
//! The fan-out registers expected counts with the completion tracker
//! *before* pushing the jobs - a downstream completion can therefore
//! never arrive ahead of its registration. Categorization is ordinarily
//! enqueued by the tracker once the note's ingredient jobs have all
//! completed (it classifies off the parsed lines); a note with no
//! ingredient lines gets its categorization job pushed here directly.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use recipe_import_domain::jobs::{
    ImageJobData, IngredientJobData, InstructionJobData, NoteJobData,
};
use recipe_import_domain::jobs::CategorizationJobData;
use recipe_import_domain::{
    ActionContext, ActionName, EventContext, ImportError, ImportId, ImportStatus, NoteId,
    PushOptions, StatusEvent,
};
use recipe_import_domain::entities::NoteRecord;

use crate::application::pipeline::{require_fields, Action, ActionFactory, WorkerDeps};
use crate::application::services::completion_tracker::CompletionCategory;

/// Registers the notes-queue actions into a worker's factory.
pub fn register_note_actions(factory: &ActionFactory<NoteJobData>) -> Result<(), ImportError> {
    factory.register(ActionName::SaveNote, Arc::new(|_| Arc::new(SaveNote)))?;
    factory.register(ActionName::FanOutNote, Arc::new(|_| Arc::new(FanOutNote)))?;
    Ok(())
}

/// Parses the note HTML and persists the note record.
pub struct SaveNote;

#[async_trait]
impl Action<NoteJobData> for SaveNote {
    fn name(&self) -> ActionName {
        ActionName::SaveNote
    }

    fn validate_input(&self, data: &NoteJobData) -> Result<(), ImportError> {
        require_fields(&[("html", Some(&data.html))])
    }

    async fn execute(
        &self,
        mut data: NoteJobData,
        deps: &WorkerDeps,
        ctx: &ActionContext,
    ) -> Result<NoteJobData, ImportError> {
        let parsed = deps.note_parser.parse(&data.html)?;

        let record = NoteRecord::new(
            NoteId::generate(),
            data.import_id.clone(),
            parsed.title.clone(),
            data.html.clone(),
            data.source_url.clone(),
        );
        let note_id = deps.notes.save(&record).await?;

        info!(
            job_id = %ctx.job_id(),
            import_id = %data.import_id,
            note_id = %note_id,
            title = %parsed.title,
            ingredients = parsed.ingredients.len(),
            instructions = parsed.instructions.len(),
            images = parsed.images.len(),
            "note saved"
        );

        if let Some(broadcaster) = deps.broadcaster() {
            let event = StatusEvent::new(
                data.import_id.clone(),
                Some(note_id.clone()),
                ImportStatus::Processing,
                EventContext::NoteProcessing,
                format!("note \"{}\" saved", parsed.title),
            )
            .with_indent(1);
            if let Err(e) = broadcaster.emit(event).await {
                warn!(job_id = %ctx.job_id(), error = %e, "failed to broadcast note-saved event");
            }
        }

        data.note_id = Some(note_id);
        data.parsed = Some(parsed);
        Ok(data)
    }
}

/// Enqueues the downstream jobs for a saved note and registers their
/// completion counters.
pub struct FanOutNote;

#[async_trait]
impl Action<NoteJobData> for FanOutNote {
    fn name(&self) -> ActionName {
        ActionName::FanOutNote
    }

    fn validate_input(&self, data: &NoteJobData) -> Result<(), ImportError> {
        if data.note_id.is_none() {
            return Err(ImportError::missing_field("note_id"));
        }
        if data.parsed.is_none() {
            return Err(ImportError::missing_field("parsed"));
        }
        Ok(())
    }

    async fn execute(
        &self,
        data: NoteJobData,
        deps: &WorkerDeps,
        ctx: &ActionContext,
    ) -> Result<NoteJobData, ImportError> {
        let note_id = data
            .note_id
            .clone()
            .ok_or_else(|| ImportError::missing_field("note_id"))?;
        let parsed = data
            .parsed
            .clone()
            .ok_or_else(|| ImportError::missing_field("parsed"))?;

        let image_count = parsed.images.len();
        let ingredient_count = parsed.ingredients.len();
        let instruction_count = parsed.instructions.len();

        // Counters first: no completion may beat its registration. Only
        // categories with work register; a category that fans out zero
        // jobs has no completions to wait for, and a note with no
        // downstream work at all is terminal right here.
        for (category, count) in [
            (CompletionCategory::Image, image_count),
            (CompletionCategory::Ingredient, ingredient_count),
            (CompletionCategory::Instruction, instruction_count),
        ] {
            if count > 0 {
                deps.completion.register(&note_id, &data.import_id, category, count);
            }
        }

        for (index, image) in parsed.images.iter().enumerate() {
            // Per-image import identity: deterministic across note-job
            // retries so re-delivery upserts instead of duplicating.
            let image_import_id = ImportId::new(format!("{}-img{}", data.import_id, index))?;
            let source_path = match &data.staged_image_dir {
                Some(dir) => std::path::Path::new(dir).join(&image.filename),
                None => std::path::PathBuf::from(&image.location),
            };
            let output_dir = deps.config.output_dir.join(image_import_id.as_str());
            let payload = ImageJobData::new(
                Some(note_id.clone()),
                image_import_id,
                source_path,
                output_dir,
                image.filename.clone(),
            );
            deps.queues.image.push(payload, PushOptions::default()).await?;
        }

        for (index, raw) in parsed.ingredients.iter().enumerate() {
            let payload = IngredientJobData {
                note_id: note_id.clone(),
                import_id: data.import_id.clone(),
                line_index: index as u32,
                raw: raw.clone(),
            };
            deps.queues.ingredients.push(payload, PushOptions::default()).await?;
        }

        for (index, text) in parsed.instructions.iter().enumerate() {
            let payload = InstructionJobData {
                note_id: note_id.clone(),
                import_id: data.import_id.clone(),
                line_index: index as u32,
                text: text.clone(),
            };
            deps.queues.instruction.push(payload, PushOptions::default()).await?;
        }

        // No ingredient jobs means the tracker will never fire the
        // ingredient-complete edge; push categorization directly.
        if ingredient_count == 0 {
            let payload = CategorizationJobData {
                note_id: note_id.clone(),
                import_id: data.import_id.clone(),
            };
            deps.queues.categorization.push(payload, PushOptions::default()).await?;
        }

        // A note with no downstream work is complete the moment it is
        // saved; nothing will ever call back into the tracker for it.
        if image_count + ingredient_count + instruction_count == 0 {
            if let Some(broadcaster) = deps.broadcaster() {
                let event = StatusEvent::new(
                    data.import_id.clone(),
                    Some(note_id.clone()),
                    ImportStatus::Completed,
                    EventContext::Import,
                    "note processing completed",
                );
                if let Err(e) = broadcaster.emit(event).await {
                    warn!(job_id = %ctx.job_id(), error = %e, "failed to broadcast note completion");
                }
            }
        }

        info!(
            job_id = %ctx.job_id(),
            import_id = %data.import_id,
            note_id = %note_id,
            image_jobs = image_count,
            ingredient_jobs = ingredient_count,
            instruction_jobs = instruction_count,
            "note fanned out"
        );

        if let Some(broadcaster) = deps.broadcaster() {
            let event = StatusEvent::new(
                data.import_id.clone(),
                Some(note_id.clone()),
                ImportStatus::Processing,
                EventContext::Import,
                "downstream processing started",
            )
            .with_metadata("image_jobs", serde_json::json!(image_count))
            .with_metadata("ingredient_jobs", serde_json::json!(ingredient_count))
            .with_metadata("instruction_jobs", serde_json::json!(instruction_count));
            if let Err(e) = broadcaster.emit(event).await {
                warn!(job_id = %ctx.job_id(), error = %e, "failed to broadcast fan-out event");
            }
        }

        Ok(data)
    }
}
