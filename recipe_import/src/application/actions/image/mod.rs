// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Image Pipeline Actions
//!
//! The fixed seven-step pipeline every image job runs, plus the
//! failure-path handler invoked when the pipeline fails terminally:
//!
//! 1. [`UploadOriginal`] - best-effort upload of the untouched source
//! 2. [`ProcessImage`] - derive the five outputs (fatal on failure)
//! 3. [`UploadProcessed`] - five isolated, concurrent best-effort uploads
//! 4. [`SaveImage`] - atomic upsert of the image record (fatal on failure)
//! 5. [`CleanupLocalFiles`] - best-effort local file removal
//! 6. [`ImageCompletedStatus`] - terminal status write + broadcast + mark
//! 7. [`CheckImageCompletion`] - defensive second completion mark
//!
//! Best-effort steps log their failures and keep the payload moving; the
//! two fatal steps are the ones whose output downstream consumers depend
//! on.

pub mod check_completion;
pub mod cleanup_local_files;
pub mod completed_status;
pub mod failed_status;
pub mod process_image;
pub mod save_image;
pub mod upload_original;
pub mod upload_processed;

pub use check_completion::CheckImageCompletion;
pub use cleanup_local_files::CleanupLocalFiles;
pub use completed_status::ImageCompletedStatus;
pub use failed_status::ImageFailedStatus;
pub use process_image::ProcessImage;
pub use save_image::SaveImage;
pub use upload_original::UploadOriginal;
pub use upload_processed::UploadProcessed;

use std::sync::Arc;

use recipe_import_domain::{ActionName, ImageJobData, ImportError};

use crate::application::pipeline::ActionFactory;

/// Registers all image-queue actions into a worker's factory.
pub fn register_image_actions(factory: &ActionFactory<ImageJobData>) -> Result<(), ImportError> {
    factory.register(ActionName::UploadOriginal, Arc::new(|_| Arc::new(UploadOriginal)))?;
    factory.register(ActionName::ProcessImage, Arc::new(|_| Arc::new(ProcessImage)))?;
    factory.register(ActionName::UploadProcessed, Arc::new(|_| Arc::new(UploadProcessed)))?;
    factory.register(ActionName::SaveImage, Arc::new(|_| Arc::new(SaveImage)))?;
    factory.register(
        ActionName::CleanupLocalFiles,
        Arc::new(|_| Arc::new(CleanupLocalFiles)),
    )?;
    factory.register(
        ActionName::ImageCompletedStatus,
        Arc::new(|_| Arc::new(ImageCompletedStatus)),
    )?;
    factory.register(
        ActionName::CheckImageCompletion,
        Arc::new(|_| Arc::new(CheckImageCompletion)),
    )?;
    Ok(())
}
