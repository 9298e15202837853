// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Save Image
//!
//! Persists the image record, keyed by the import id (atomic upsert).
//!
//! Each derivative URL resolves remote-first: the object-store URL when
//! its upload succeeded, otherwise the locally served
//! `{image_base_url}/images/{basename}` for the derivative file. The
//! record lands with status `COMPLETED` and a cleared error; the returned
//! surrogate id is assigned into the payload - the single point where
//! `image_id` becomes set.
//!
//! Database failures raise and fail the pipeline.

use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use recipe_import_domain::{
    ActionContext, ActionName, DerivativeKind, ImageJobData, ImageRecord, ImportError,
    ProcessingStatus,
};

use crate::application::pipeline::{require_fields, Action, WorkerDeps};

pub struct SaveImage;

impl SaveImage {
    fn local_fallback_url(deps: &WorkerDeps, path: &Path) -> Option<String> {
        path.file_name()
            .map(|name| deps.config.local_image_url(&name.to_string_lossy()))
    }
}

#[async_trait]
impl Action<ImageJobData> for SaveImage {
    fn name(&self) -> ActionName {
        ActionName::SaveImage
    }

    fn validate_input(&self, data: &ImageJobData) -> Result<(), ImportError> {
        require_fields(&[("filename", Some(&data.filename))])
    }

    async fn execute(
        &self,
        mut data: ImageJobData,
        deps: &WorkerDeps,
        ctx: &ActionContext,
    ) -> Result<ImageJobData, ImportError> {
        let mut record = ImageRecord::pending(data.import_id.clone(), data.note_id.clone());
        record.image_id = data.image_id.clone();
        record.processing_status = ProcessingStatus::Completed;
        record.processing_error = None;

        for (kind, slot) in data.derivatives() {
            let url = slot
                .remote_url
                .clone()
                .or_else(|| slot.path.as_deref().and_then(|p| Self::local_fallback_url(deps, p)));
            if let Some(url) = url {
                record.set_url(kind, url);
            }
        }

        if let Some(metadata) = &data.metadata {
            record.original_width = Some(metadata.width);
            record.original_height = Some(metadata.height);
            record.original_format = Some(metadata.format.clone());
        }
        record.original_size = data.derivative(DerivativeKind::Original).size_bytes;

        let image_id = deps.images.upsert(&record).await?;
        info!(
            job_id = %ctx.job_id(),
            import_id = %data.import_id,
            image_id = %image_id,
            "image record persisted"
        );
        data.image_id = Some(image_id);
        Ok(data)
    }
}
