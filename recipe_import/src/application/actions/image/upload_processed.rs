// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Upload Processed
//!
//! Uploads each produced derivative under
//! `processed/{import_id}/{note_id_or_import_id}-{name}{ext}`.
//!
//! The five uploads are isolated from one another and issue concurrently;
//! the action waits for all of them to settle. A failed upload leaves
//! only that derivative's URL absent - the persistence step then falls
//! back to the locally served URL for it. This action never raises.

use async_trait::async_trait;
use futures::future::join_all;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use recipe_import_domain::services::StoredObject;
use recipe_import_domain::value_objects::derivative::processed_key;
use recipe_import_domain::{ActionContext, ActionName, DerivativeKind, ImageJobData, ImportError};

use crate::application::pipeline::{Action, WorkerDeps};

enum UploadOutcome {
    Uploaded(StoredObject),
    NotProduced,
    Failed(ImportError),
}

pub struct UploadProcessed;

#[async_trait]
impl Action<ImageJobData> for UploadProcessed {
    fn name(&self) -> ActionName {
        ActionName::UploadProcessed
    }

    async fn execute(
        &self,
        mut data: ImageJobData,
        deps: &WorkerDeps,
        ctx: &ActionContext,
    ) -> Result<ImageJobData, ImportError> {
        let Some(store) = deps.object_store.clone() else {
            debug!(
                job_id = %ctx.job_id(),
                import_id = %data.import_id,
                "no object store configured; skipping derivative uploads"
            );
            return Ok(data);
        };

        let uploads = DerivativeKind::ALL.map(|kind| {
            let store = store.clone();
            let path: Option<PathBuf> = data.derivative_path(kind).map(PathBuf::from);
            let key = processed_key(&data.import_id, data.note_id.as_ref(), kind, &data.filename);
            async move {
                let Some(path) = path else {
                    return (kind, key, UploadOutcome::NotProduced);
                };
                match tokio::fs::metadata(&path).await {
                    Ok(_) => {}
                    Err(e) => {
                        return (
                            kind,
                            key,
                            UploadOutcome::Failed(ImportError::io(format!(
                                "derivative {} unreadable: {e}",
                                path.display()
                            ))),
                        );
                    }
                }
                match store.upload_file(&path, &key).await {
                    Ok(stored) => (kind, key, UploadOutcome::Uploaded(stored)),
                    Err(e) => (kind, key, UploadOutcome::Failed(e)),
                }
            }
        });

        let mut uploaded = 0usize;
        let mut failed = 0usize;
        for (kind, key, outcome) in join_all(uploads).await {
            match outcome {
                UploadOutcome::Uploaded(stored) => {
                    uploaded += 1;
                    data.record_upload(kind, stored.key, stored.url);
                }
                UploadOutcome::NotProduced => {
                    debug!(
                        job_id = %ctx.job_id(),
                        derivative = %kind,
                        "derivative not produced; nothing to upload"
                    );
                }
                UploadOutcome::Failed(e) => {
                    failed += 1;
                    warn!(
                        job_id = %ctx.job_id(),
                        import_id = %data.import_id,
                        derivative = %kind,
                        key = %key,
                        error = %e,
                        "derivative upload failed; URL will fall back to local serving"
                    );
                }
            }
        }

        info!(
            job_id = %ctx.job_id(),
            import_id = %data.import_id,
            uploaded,
            failed,
            "derivative uploads settled"
        );
        Ok(data)
    }
}
