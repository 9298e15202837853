// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Check Image Completion
//!
//! Defensive final step: report completion to the tracker once more. The
//! tracker's `(note, category, job)` idempotency makes the duplicate mark
//! harmless, and the redundancy covers the window where the status step's
//! own mark was lost to a tracker hiccup. Skips quietly when the payload
//! has no note id. Never raises.

use async_trait::async_trait;
use tracing::debug;

use recipe_import_domain::{ActionContext, ActionName, ImageJobData, ImportError};

use crate::application::pipeline::{Action, WorkerDeps};
use crate::application::services::completion_tracker::CompletionCategory;

pub struct CheckImageCompletion;

#[async_trait]
impl Action<ImageJobData> for CheckImageCompletion {
    fn name(&self) -> ActionName {
        ActionName::CheckImageCompletion
    }

    async fn execute(
        &self,
        data: ImageJobData,
        deps: &WorkerDeps,
        ctx: &ActionContext,
    ) -> Result<ImageJobData, ImportError> {
        match &data.note_id {
            None => {
                debug!(
                    job_id = %ctx.job_id(),
                    import_id = %data.import_id,
                    "no note id on payload; skipping completion check"
                );
            }
            Some(note_id) => {
                deps.completion
                    .mark_complete(note_id, CompletionCategory::Image, ctx.job_id())
                    .await;
            }
        }
        Ok(data)
    }
}
