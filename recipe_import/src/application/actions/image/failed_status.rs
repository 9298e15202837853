// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Image Failed Status
//!
//! The failure path the image worker runs when a pipeline fails
//! terminally: write `FAILED` and the error message onto the persisted
//! record (if one exists for the import), broadcast the FAILED event, and
//! report completion to the tracker so the note's fan-in never hangs on a
//! failed job. Every step is best-effort; this handler never raises.

use async_trait::async_trait;
use tracing::{error, warn};

use recipe_import_domain::{
    ActionContext, EventContext, ImageJobData, ImportError, ImportStatus, StatusEvent,
};

use crate::application::pipeline::WorkerDeps;
use crate::application::services::completion_tracker::CompletionCategory;
use crate::application::workers::base_worker::TerminalFailureHandler;

pub struct ImageFailedStatus;

#[async_trait]
impl TerminalFailureHandler<ImageJobData> for ImageFailedStatus {
    async fn on_terminal_failure(
        &self,
        data: ImageJobData,
        failure: &ImportError,
        deps: &WorkerDeps,
        ctx: &ActionContext,
    ) {
        let message = failure.root_message();
        error!(
            job_id = %ctx.job_id(),
            import_id = %data.import_id,
            error = %message,
            "image pipeline failed terminally"
        );

        if let Err(e) = deps.images.mark_failed(&data.import_id, &message).await {
            warn!(
                job_id = %ctx.job_id(),
                import_id = %data.import_id,
                error = %e,
                "failed to persist failure status"
            );
        }

        if let Some(broadcaster) = deps.broadcaster() {
            let event = StatusEvent::new(
                data.import_id.clone(),
                data.note_id.clone(),
                ImportStatus::Failed,
                EventContext::ImageProcessing,
                message.clone(),
            )
            .with_indent(2);
            if let Err(e) = broadcaster.emit(event).await {
                warn!(
                    job_id = %ctx.job_id(),
                    import_id = %data.import_id,
                    error = %e,
                    "failed to broadcast failure event"
                );
            }
        }

        // A failed image still counts toward fan-in, or the note would
        // wait forever.
        if let Some(note_id) = &data.note_id {
            deps.completion
                .mark_complete(note_id, CompletionCategory::Image, ctx.job_id())
                .await;
        }
    }
}
