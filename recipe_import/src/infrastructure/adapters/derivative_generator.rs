// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Derivative Generator
//!
//! [`ImageProcessor`] implementation over the `image` crate. Produces the
//! five derivatives of a source image - a re-encoded original, a bounded
//! thumbnail, and center crops at 3:2, 4:3, and 16:9 - into the job's
//! output directory with deterministic `-{name}` suffixes.
//!
//! Decoding runs on the blocking pool: image work is CPU-bound and must
//! not stall the worker's async executor.
//!
//! ## Failure Mapping
//!
//! Decode and encode failures are `PARSING` errors (deterministic; the
//! image will not become decodable on retry). Filesystem failures are IO
//! errors. Both fail the pipeline.

use async_trait::async_trait;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

use recipe_import_domain::jobs::ImageMetadata;
use recipe_import_domain::services::{DerivativeOutput, ImageProcessor, ProcessedImage};
use recipe_import_domain::value_objects::derivative::split_filename;
use recipe_import_domain::{DerivativeKind, ImportError};

/// Bounding box for thumbnail derivatives.
const THUMBNAIL_MAX_DIM: u32 = 400;

pub struct DerivativeGenerator;

impl DerivativeGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Center crop to the target aspect ratio, keeping the largest
    /// possible region.
    fn center_crop(img: &DynamicImage, aspect_w: u32, aspect_h: u32) -> DynamicImage {
        let (w, h) = (img.width(), img.height());
        // Compare w/h against aspect_w/aspect_h without floating point.
        let too_wide = (w as u64) * (aspect_h as u64) > (h as u64) * (aspect_w as u64);
        if too_wide {
            let crop_w = ((h as u64) * (aspect_w as u64) / (aspect_h as u64)) as u32;
            let crop_w = crop_w.max(1);
            img.crop_imm((w - crop_w) / 2, 0, crop_w, h)
        } else {
            let crop_h = ((w as u64) * (aspect_h as u64) / (aspect_w as u64)) as u32;
            let crop_h = crop_h.max(1);
            img.crop_imm(0, (h - crop_h) / 2, w, crop_h)
        }
    }

    fn derive(img: &DynamicImage, kind: DerivativeKind) -> DynamicImage {
        match kind.aspect_ratio() {
            None => match kind {
                DerivativeKind::Original => img.clone(),
                _ => img.thumbnail(THUMBNAIL_MAX_DIM, THUMBNAIL_MAX_DIM),
            },
            Some((aw, ah)) => Self::center_crop(img, aw, ah),
        }
    }

    fn generate_blocking(
        source: &Path,
        output_dir: &Path,
        filename: &str,
    ) -> Result<ProcessedImage, ImportError> {
        let img = image::open(source)
            .map_err(|e| ImportError::parsing(format!("failed to decode {}: {e}", source.display())))?;

        let format = ImageFormat::from_path(source).unwrap_or(ImageFormat::Jpeg);
        let format_name = format!("{format:?}").to_lowercase();
        let metadata = ImageMetadata {
            width: img.width(),
            height: img.height(),
            format: format_name,
        };

        std::fs::create_dir_all(output_dir).map_err(|e| {
            ImportError::io(format!(
                "failed to create output directory {}: {e}",
                output_dir.display()
            ))
        })?;

        let (stem, ext) = split_filename(filename);
        let ext = if ext.is_empty() { ".jpg".to_string() } else { ext };

        let mut outputs = Vec::with_capacity(DerivativeKind::ALL.len());
        for kind in DerivativeKind::ALL {
            let derived = Self::derive(&img, kind);
            let path = output_dir.join(format!("{stem}{}{ext}", kind.suffix()));
            derived.save_with_format(&path, format).map_err(|e| {
                ImportError::parsing(format!("failed to encode {}: {e}", path.display()))
            })?;
            let size_bytes = std::fs::metadata(&path)
                .map_err(|e| ImportError::io(format!("failed to stat {}: {e}", path.display())))?
                .len();
            debug!(path = %path.display(), size_bytes, derivative = %kind, "derivative written");
            outputs.push(DerivativeOutput {
                kind,
                path,
                size_bytes,
            });
        }

        Ok(ProcessedImage { outputs, metadata })
    }
}

impl Default for DerivativeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageProcessor for DerivativeGenerator {
    async fn generate_derivatives(
        &self,
        source: &Path,
        output_dir: &Path,
        filename: &str,
    ) -> Result<ProcessedImage, ImportError> {
        let source = source.to_path_buf();
        let output_dir: PathBuf = output_dir.to_path_buf();
        let filename = filename.to_string();

        tokio::task::spawn_blocking(move || {
            Self::generate_blocking(&source, &output_dir, &filename)
        })
        .await
        .map_err(|e| ImportError::internal(format!("derivative task panicked: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn write_test_image(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        let img = RgbImage::from_fn(w, h, |x, y| image::Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
        img.save(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn test_produces_all_five_derivatives() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_test_image(dir.path(), "a.png", 640, 480);
        let out = dir.path().join("out");

        let processed = DerivativeGenerator::new()
            .generate_derivatives(&source, &out, "a.png")
            .await
            .unwrap();

        assert_eq!(processed.outputs.len(), 5);
        assert_eq!(processed.metadata.width, 640);
        assert_eq!(processed.metadata.height, 480);
        assert_eq!(processed.metadata.format, "png");
        for kind in DerivativeKind::ALL {
            let output = processed.output_for(kind).unwrap();
            assert!(output.path.exists(), "missing {}", output.path.display());
            assert!(output.size_bytes > 0);
            assert!(output
                .path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .contains(kind.suffix().as_str()));
        }
    }

    #[tokio::test]
    async fn test_crop_aspect_ratios() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_test_image(dir.path(), "wide.png", 1600, 900);
        let out = dir.path().join("out");

        let processed = DerivativeGenerator::new()
            .generate_derivatives(&source, &out, "wide.png")
            .await
            .unwrap();

        let crop = processed.output_for(DerivativeKind::Crop4x3).unwrap();
        let img = image::open(&crop.path).unwrap();
        // 1600x900 cropped to 4:3 keeps full height: 1200x900.
        assert_eq!((img.width(), img.height()), (1200, 900));

        let crop = processed.output_for(DerivativeKind::Crop16x9).unwrap();
        let img = image::open(&crop.path).unwrap();
        assert_eq!((img.width(), img.height()), (1600, 900));
    }

    #[tokio::test]
    async fn test_missing_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DerivativeGenerator::new()
            .generate_derivatives(&dir.path().join("missing.png"), dir.path(), "missing.png")
            .await
            .unwrap_err();
        assert!(!err.is_retryable() || matches!(err, ImportError::IoError(_)));
    }

    #[tokio::test]
    async fn test_thumbnail_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_test_image(dir.path(), "big.png", 2000, 1000);
        let out = dir.path().join("out");

        let processed = DerivativeGenerator::new()
            .generate_derivatives(&source, &out, "big.png")
            .await
            .unwrap();
        let thumb = processed.output_for(DerivativeKind::Thumbnail).unwrap();
        let img = image::open(&thumb.path).unwrap();
        assert!(img.width() <= THUMBNAIL_MAX_DIM);
        assert!(img.height() <= THUMBNAIL_MAX_DIM);
    }
}
