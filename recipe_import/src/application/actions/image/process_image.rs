// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Process Image
//!
//! Derives the five outputs (original, thumbnail, 3:2, 4:3, 16:9) into
//! the job's output directory and records their paths, byte sizes, and
//! the source's intrinsic metadata on the payload.
//!
//! This is the load-bearing step of the pipeline: a missing source file
//! or any processor failure fails the job. Downstream persistence assumes
//! the complete derivative set exists.

use async_trait::async_trait;
use tracing::info;

use recipe_import_domain::{ActionContext, ActionName, ImageJobData, ImportError};

use crate::application::pipeline::{require_fields, Action, WorkerDeps};

pub struct ProcessImage;

#[async_trait]
impl Action<ImageJobData> for ProcessImage {
    fn name(&self) -> ActionName {
        ActionName::ProcessImage
    }

    fn validate_input(&self, data: &ImageJobData) -> Result<(), ImportError> {
        require_fields(&[
            ("filename", Some(&data.filename)),
            ("image_path", data.image_path.to_str()),
            ("output_dir", data.output_dir.to_str()),
        ])
    }

    async fn execute(
        &self,
        mut data: ImageJobData,
        deps: &WorkerDeps,
        ctx: &ActionContext,
    ) -> Result<ImageJobData, ImportError> {
        match tokio::fs::metadata(&data.image_path).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ImportError::validation(format!(
                    "source image {} does not exist",
                    data.image_path.display()
                )));
            }
            Err(e) => {
                return Err(ImportError::io(format!(
                    "cannot stat source image {}: {e}",
                    data.image_path.display()
                )));
            }
        }

        let processed = deps
            .image_processor
            .generate_derivatives(&data.image_path, &data.output_dir, &data.filename)
            .await?;

        for output in &processed.outputs {
            data.record_derivative(output.kind, output.path.clone(), output.size_bytes);
        }
        data.metadata = Some(processed.metadata.clone());

        info!(
            job_id = %ctx.job_id(),
            import_id = %data.import_id,
            width = processed.metadata.width,
            height = processed.metadata.height,
            format = %processed.metadata.format,
            derivatives = processed.outputs.len(),
            "image derivatives produced"
        );
        Ok(data)
    }
}
