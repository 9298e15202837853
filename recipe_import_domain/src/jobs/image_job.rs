// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Image Job Payload
//!
//! The payload threaded through the image pipeline, action by action. Each
//! action receives the payload by value and returns a (possibly
//! transformed) copy for its successor; nothing in the pipeline mutates a
//! payload another action can still observe.
//!
//! ## Invariants
//!
//! 1. Identity fields (note id, import id), once set, never change across
//!    the pipeline.
//! 2. A derivative path is present iff that derivative has been produced on
//!    the local filesystem.
//! 3. A remote URL is present iff the corresponding upload succeeded.
//! 4. The image id becomes present exactly once - when the persistence step
//!    runs - and is stable afterwards.
//!
//! ## Field Groups
//!
//! - **Identity**: `note_id`, `import_id`, `image_id`
//! - **Input**: `image_path`, `output_dir`, `filename`
//! - **Derivatives**: per-kind [`DerivativeSlot`]s holding local path, byte
//!   size, and remote key/URL
//! - **Metadata**: intrinsic width/height/format of the source image
//! - **Original upload**: `original_key` / `original_url` for the untouched
//!   source object

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::value_objects::{DerivativeKind, ImageId, ImportId, NoteId};

/// Intrinsic metadata of the source image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    /// Container format name, e.g. `jpeg`, `png`.
    pub format: String,
}

/// Per-derivative production and upload state.
///
/// `path`/`size_bytes` are filled by the processing step; `remote_key`/
/// `remote_url` by the (best-effort) upload step. Absent fields mean the
/// corresponding stage has not produced that artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivativeSlot {
    pub path: Option<PathBuf>,
    pub size_bytes: Option<u64>,
    pub remote_key: Option<String>,
    pub remote_url: Option<String>,
}

/// The payload of one image-queue job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageJobData {
    /// Owning note; may be absent for images processed ahead of note
    /// persistence.
    pub note_id: Option<NoteId>,
    /// Import operation identity; upsert key of the image record.
    pub import_id: ImportId,
    /// Surrogate database id; assigned by the persistence step.
    pub image_id: Option<ImageId>,

    /// Source file on the local filesystem.
    pub image_path: PathBuf,
    /// Directory derivative files are written into.
    pub output_dir: PathBuf,
    /// Original filename, extension included.
    pub filename: String,

    /// Untouched-original upload state.
    pub original_key: Option<String>,
    pub original_url: Option<String>,

    original: DerivativeSlot,
    thumbnail: DerivativeSlot,
    crop3x2: DerivativeSlot,
    crop4x3: DerivativeSlot,
    crop16x9: DerivativeSlot,

    pub metadata: Option<ImageMetadata>,
}

impl ImageJobData {
    /// A fresh payload for one source image.
    pub fn new(
        note_id: Option<NoteId>,
        import_id: ImportId,
        image_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            note_id,
            import_id,
            image_id: None,
            image_path: image_path.into(),
            output_dir: output_dir.into(),
            filename: filename.into(),
            original_key: None,
            original_url: None,
            original: DerivativeSlot::default(),
            thumbnail: DerivativeSlot::default(),
            crop3x2: DerivativeSlot::default(),
            crop4x3: DerivativeSlot::default(),
            crop16x9: DerivativeSlot::default(),
            metadata: None,
        }
    }

    /// The slot for a derivative kind.
    pub fn derivative(&self, kind: DerivativeKind) -> &DerivativeSlot {
        match kind {
            DerivativeKind::Original => &self.original,
            DerivativeKind::Thumbnail => &self.thumbnail,
            DerivativeKind::Crop3x2 => &self.crop3x2,
            DerivativeKind::Crop4x3 => &self.crop4x3,
            DerivativeKind::Crop16x9 => &self.crop16x9,
        }
    }

    /// Mutable slot access; pipeline actions use this on their own copy.
    pub fn derivative_mut(&mut self, kind: DerivativeKind) -> &mut DerivativeSlot {
        match kind {
            DerivativeKind::Original => &mut self.original,
            DerivativeKind::Thumbnail => &mut self.thumbnail,
            DerivativeKind::Crop3x2 => &mut self.crop3x2,
            DerivativeKind::Crop4x3 => &mut self.crop4x3,
            DerivativeKind::Crop16x9 => &mut self.crop16x9,
        }
    }

    /// All derivative slots paired with their kinds.
    pub fn derivatives(&self) -> impl Iterator<Item = (DerivativeKind, &DerivativeSlot)> {
        DerivativeKind::ALL.into_iter().map(|kind| (kind, self.derivative(kind)))
    }

    /// Records a produced derivative file.
    pub fn record_derivative(&mut self, kind: DerivativeKind, path: PathBuf, size_bytes: u64) {
        let slot = self.derivative_mut(kind);
        slot.path = Some(path);
        slot.size_bytes = Some(size_bytes);
    }

    /// Records a successful derivative upload.
    pub fn record_upload(&mut self, kind: DerivativeKind, key: String, url: String) {
        let slot = self.derivative_mut(kind);
        slot.remote_key = Some(key);
        slot.remote_url = Some(url);
    }

    /// Every local file the cleanup step is responsible for: the source
    /// plus each produced derivative.
    pub fn local_files(&self) -> Vec<PathBuf> {
        let mut files = vec![self.image_path.clone()];
        for (_, slot) in self.derivatives() {
            if let Some(path) = &slot.path {
                files.push(path.clone());
            }
        }
        files
    }

    /// Whether every derivative has been produced locally.
    pub fn all_derivatives_produced(&self) -> bool {
        self.derivatives().all(|(_, slot)| slot.path.is_some())
    }

    /// The local path of a derivative, if produced.
    pub fn derivative_path(&self, kind: DerivativeKind) -> Option<&Path> {
        self.derivative(kind).path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ImageJobData {
        ImageJobData::new(
            Some(NoteId::new("n1").unwrap()),
            ImportId::new("i1").unwrap(),
            "/t/a.jpg",
            "/t/out",
            "a.jpg",
        )
    }

    #[test]
    fn test_fresh_payload_has_no_artifacts() {
        let data = payload();
        assert!(data.image_id.is_none());
        assert!(data.original_key.is_none());
        assert!(data.metadata.is_none());
        for (_, slot) in data.derivatives() {
            assert_eq!(slot, &DerivativeSlot::default());
        }
        assert_eq!(data.local_files(), vec![PathBuf::from("/t/a.jpg")]);
    }

    #[test]
    fn test_record_derivative_fills_slot() {
        let mut data = payload();
        data.record_derivative(DerivativeKind::Thumbnail, "/t/out/a-thumbnail.jpg".into(), 1024);
        let slot = data.derivative(DerivativeKind::Thumbnail);
        assert_eq!(slot.path.as_deref(), Some(Path::new("/t/out/a-thumbnail.jpg")));
        assert_eq!(slot.size_bytes, Some(1024));
        assert!(slot.remote_url.is_none());
        assert!(!data.all_derivatives_produced());
    }

    #[test]
    fn test_local_files_includes_produced_derivatives_only() {
        let mut data = payload();
        data.record_derivative(DerivativeKind::Original, "/t/out/a-original.jpg".into(), 10);
        data.record_derivative(DerivativeKind::Crop16x9, "/t/out/a-crop16x9.jpg".into(), 10);
        let files = data.local_files();
        assert_eq!(files.len(), 3);
        assert!(files.contains(&PathBuf::from("/t/a.jpg")));
        assert!(files.contains(&PathBuf::from("/t/out/a-crop16x9.jpg")));
    }

    #[test]
    fn test_record_upload_fills_remote_fields() {
        let mut data = payload();
        data.record_upload(
            DerivativeKind::Crop4x3,
            "processed/i1/n1-crop4x3.jpg".to_string(),
            "https://r2/processed/i1/n1-crop4x3.jpg".to_string(),
        );
        let slot = data.derivative(DerivativeKind::Crop4x3);
        assert!(slot.remote_key.is_some());
        assert!(slot.remote_url.is_some());
        assert!(slot.path.is_none());
    }
}
