// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Cleanup Local Files
//!
//! Best-effort removal of the job's local artifacts: the source file plus
//! every produced derivative, then the output directory iff it ended up
//! empty. An already-deleted file counts as success; a non-empty output
//! directory is left alone (another job may share it). The action logs a
//! `{succeeded} successful, {failed} failed` summary, returns the payload
//! unchanged, and never raises - cleanup failure must never fail a
//! pipeline whose primary work has succeeded.

use async_trait::async_trait;
use std::io::ErrorKind;
use tracing::{debug, info, warn};

use recipe_import_domain::{ActionContext, ActionName, ImageJobData, ImportError};

use crate::application::pipeline::{Action, WorkerDeps};

pub struct CleanupLocalFiles;

#[async_trait]
impl Action<ImageJobData> for CleanupLocalFiles {
    fn name(&self) -> ActionName {
        ActionName::CleanupLocalFiles
    }

    async fn execute(
        &self,
        data: ImageJobData,
        _deps: &WorkerDeps,
        ctx: &ActionContext,
    ) -> Result<ImageJobData, ImportError> {
        let mut succeeded = 0usize;
        let mut failed = 0usize;

        for path in data.local_files() {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => succeeded += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    // Already gone is as good as deleted.
                    succeeded += 1;
                }
                Err(e) => {
                    failed += 1;
                    warn!(
                        job_id = %ctx.job_id(),
                        path = %path.display(),
                        error = %e,
                        "failed to delete local file"
                    );
                }
            }
        }

        match tokio::fs::read_dir(&data.output_dir).await {
            Ok(mut entries) => match entries.next_entry().await {
                Ok(None) => {
                    if let Err(e) = tokio::fs::remove_dir(&data.output_dir).await {
                        warn!(
                            job_id = %ctx.job_id(),
                            dir = %data.output_dir.display(),
                            error = %e,
                            "failed to remove empty output directory"
                        );
                    }
                }
                Ok(Some(_)) => {
                    debug!(
                        job_id = %ctx.job_id(),
                        dir = %data.output_dir.display(),
                        "output directory not empty; leaving it"
                    );
                }
                Err(e) => {
                    warn!(
                        job_id = %ctx.job_id(),
                        dir = %data.output_dir.display(),
                        error = %e,
                        "failed to inspect output directory"
                    );
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(
                    job_id = %ctx.job_id(),
                    dir = %data.output_dir.display(),
                    error = %e,
                    "failed to open output directory"
                );
            }
        }

        info!(
            job_id = %ctx.job_id(),
            import_id = %data.import_id,
            succeeded,
            failed,
            "local cleanup finished: {succeeded} successful, {failed} failed"
        );
        Ok(data)
    }
}
