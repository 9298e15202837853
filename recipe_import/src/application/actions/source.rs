// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Source Pipeline Action
//!
//! Acquires note HTML from a staged location on the local filesystem and
//! enqueues the notes-queue job that starts the import proper. Remote
//! acquisition (fetching from the note service) happens upstream of this
//! platform; by the time a source job exists its payload points at staged
//! bytes.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use recipe_import_domain::jobs::{NoteJobData, SourceJobData};
use recipe_import_domain::{
    ActionContext, ActionName, EventContext, ImportError, ImportStatus, PushOptions, StatusEvent,
};

use crate::application::pipeline::{require_fields, Action, ActionFactory, WorkerDeps};

/// Registers the source-queue actions into a worker's factory.
pub fn register_source_actions(factory: &ActionFactory<SourceJobData>) -> Result<(), ImportError> {
    factory.register(ActionName::ProcessSource, Arc::new(|_| Arc::new(ProcessSource)))?;
    Ok(())
}

pub struct ProcessSource;

#[async_trait]
impl Action<SourceJobData> for ProcessSource {
    fn name(&self) -> ActionName {
        ActionName::ProcessSource
    }

    fn validate_input(&self, data: &SourceJobData) -> Result<(), ImportError> {
        require_fields(&[("location", Some(&data.location))])
    }

    async fn execute(
        &self,
        data: SourceJobData,
        deps: &WorkerDeps,
        ctx: &ActionContext,
    ) -> Result<SourceJobData, ImportError> {
        let path = Path::new(&data.location);
        let html = match tokio::fs::read_to_string(path).await {
            Ok(html) => html,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ImportError::validation(format!(
                    "source file {} does not exist",
                    path.display()
                )));
            }
            Err(e) => {
                return Err(ImportError::io(format!(
                    "failed to read source {}: {e}",
                    path.display()
                )));
            }
        };

        let staged_image_dir = path
            .parent()
            .map(|parent| parent.to_string_lossy().into_owned());

        let mut payload = NoteJobData::new(data.import_id.clone(), html);
        payload.staged_image_dir = staged_image_dir;
        let job_id = deps.queues.notes.push(payload, PushOptions::default()).await?;

        info!(
            job_id = %ctx.job_id(),
            import_id = %data.import_id,
            note_job_id = %job_id,
            source = %path.display(),
            "source staged into notes queue"
        );

        if let Some(broadcaster) = deps.broadcaster() {
            let event = StatusEvent::new(
                data.import_id.clone(),
                None,
                ImportStatus::Processing,
                EventContext::Source,
                "source acquired",
            );
            if let Err(e) = broadcaster.emit(event).await {
                warn!(job_id = %ctx.job_id(), error = %e, "failed to broadcast source event");
            }
        }

        Ok(data)
    }
}
