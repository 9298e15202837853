// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Image Completed Status
//!
//! Terminal bookkeeping for a successful image pipeline: re-assert the
//! record's `COMPLETED` status with a cleared error, broadcast the
//! "image processed" event (iff a broadcaster is bound, with preview URLs
//! in the metadata), then report completion to the tracker. The status
//! write propagates on failure; broadcast and tracker failures are logged
//! and swallowed.

use async_trait::async_trait;
use tracing::{debug, warn};

use recipe_import_domain::{
    ActionContext, ActionName, DerivativeKind, EventContext, ImageJobData, ImportError,
    ImportStatus, ProcessingStatus, StatusEvent,
};

use crate::application::pipeline::{Action, WorkerDeps};
use crate::application::services::completion_tracker::CompletionCategory;

pub struct ImageCompletedStatus;

#[async_trait]
impl Action<ImageJobData> for ImageCompletedStatus {
    fn name(&self) -> ActionName {
        ActionName::ImageCompletedStatus
    }

    async fn execute(
        &self,
        data: ImageJobData,
        deps: &WorkerDeps,
        ctx: &ActionContext,
    ) -> Result<ImageJobData, ImportError> {
        match &data.image_id {
            Some(image_id) => {
                deps.images
                    .update_status(image_id, ProcessingStatus::Completed, None)
                    .await?;
            }
            None => {
                warn!(
                    job_id = %ctx.job_id(),
                    import_id = %data.import_id,
                    "no image id on payload; skipping status update"
                );
            }
        }

        match deps.broadcaster() {
            Some(broadcaster) => {
                let mut event = StatusEvent::new(
                    data.import_id.clone(),
                    data.note_id.clone(),
                    ImportStatus::Processing,
                    EventContext::ImageProcessing,
                    "image processed",
                )
                .with_indent(2);
                if let Some(url) = &data.derivative(DerivativeKind::Thumbnail).remote_url {
                    event = event.with_metadata("thumbnail_url", serde_json::json!(url));
                }
                if let Some(url) = &data.original_url {
                    event = event.with_metadata("original_url", serde_json::json!(url));
                }
                if let Err(e) = broadcaster.emit(event).await {
                    warn!(
                        job_id = %ctx.job_id(),
                        import_id = %data.import_id,
                        error = %e,
                        "failed to broadcast image-processed event"
                    );
                }
            }
            None => {
                debug!(
                    job_id = %ctx.job_id(),
                    import_id = %data.import_id,
                    "no broadcaster bound; skipping image-processed event"
                );
            }
        }

        if let Some(note_id) = &data.note_id {
            deps.completion
                .mark_complete(note_id, CompletionCategory::Image, ctx.job_id())
                .await;
        }

        Ok(data)
    }
}
