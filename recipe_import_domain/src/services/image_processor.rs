// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Image Processor Port
//!
//! Derivative generation for one source image: a re-encoded original, a
//! thumbnail, and the three aspect-ratio center crops, written to the job's
//! output directory with deterministic suffixes. Processor failures are
//! fatal to the image pipeline - a half-derived image set is never
//! persisted.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::jobs::ImageMetadata;
use crate::value_objects::DerivativeKind;
use crate::ImportError;

/// One produced derivative file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivativeOutput {
    pub kind: DerivativeKind,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// The full derivative set plus the source's intrinsic metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub outputs: Vec<DerivativeOutput>,
    pub metadata: ImageMetadata,
}

impl ProcessedImage {
    /// The output for one derivative kind, if present.
    pub fn output_for(&self, kind: DerivativeKind) -> Option<&DerivativeOutput> {
        self.outputs.iter().find(|o| o.kind == kind)
    }
}

/// Produces the five derivatives of a source image.
#[async_trait]
pub trait ImageProcessor: Send + Sync {
    /// Derives all five outputs into `output_dir`.
    ///
    /// Output filenames are `{basename}{suffix}{ext}` for each
    /// [`DerivativeKind`]; the implementation must produce the complete set
    /// or fail.
    async fn generate_derivatives(
        &self,
        source: &Path,
        output_dir: &Path,
        filename: &str,
    ) -> Result<ProcessedImage, ImportError>;
}
