// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Upload Original
//!
//! Best-effort upload of the untouched source image under
//! `originals/{import_id}/{basename}{ext}`. The original in the object
//! store is an optimization (it lets re-processing skip re-ingestion),
//! not a prerequisite: a missing store, a missing source file, or a
//! failed upload all log and continue with the remote fields absent. The
//! authoritative source-exists check is the processing step's, which is
//! fatal.

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use recipe_import_domain::value_objects::derivative::original_key;
use recipe_import_domain::{ActionContext, ActionName, ImageJobData, ImportError};

use crate::application::pipeline::{require_fields, Action, WorkerDeps};

pub struct UploadOriginal;

#[async_trait]
impl Action<ImageJobData> for UploadOriginal {
    fn name(&self) -> ActionName {
        ActionName::UploadOriginal
    }

    fn validate_input(&self, data: &ImageJobData) -> Result<(), ImportError> {
        require_fields(&[
            ("filename", Some(&data.filename)),
            ("image_path", data.image_path.to_str()),
        ])
    }

    async fn execute(
        &self,
        mut data: ImageJobData,
        deps: &WorkerDeps,
        ctx: &ActionContext,
    ) -> Result<ImageJobData, ImportError> {
        let Some(store) = &deps.object_store else {
            debug!(
                job_id = %ctx.job_id(),
                import_id = %data.import_id,
                "no object store configured; skipping original upload"
            );
            return Ok(data);
        };

        match tokio::fs::metadata(&data.image_path).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                error!(
                    job_id = %ctx.job_id(),
                    import_id = %data.import_id,
                    path = %data.image_path.display(),
                    "source image does not exist; skipping original upload"
                );
                return Ok(data);
            }
            Err(e) => {
                warn!(
                    job_id = %ctx.job_id(),
                    path = %data.image_path.display(),
                    error = %e,
                    "cannot stat source image; skipping original upload"
                );
                return Ok(data);
            }
        }

        let key = original_key(&data.import_id, &data.filename);
        match store.upload_file(&data.image_path, &key).await {
            Ok(stored) => {
                info!(
                    job_id = %ctx.job_id(),
                    import_id = %data.import_id,
                    key = %stored.key,
                    size = stored.size,
                    "original uploaded"
                );
                data.original_key = Some(stored.key);
                data.original_url = Some(stored.url);
            }
            Err(e) => {
                warn!(
                    job_id = %ctx.job_id(),
                    import_id = %data.import_id,
                    key = %key,
                    error = %e,
                    "original upload failed; continuing without it"
                );
            }
        }

        Ok(data)
    }
}
