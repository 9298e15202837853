// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Image Derivative Kinds
//!
//! The five derivatives produced from every imported image, plus the
//! deterministic path and object-store key arithmetic that goes with them.
//!
//! ## Key Layout (bit-exact)
//!
//! - Originals: `originals/{import_id}/{basename_without_ext}{original_ext}`
//! - Processed: `processed/{import_id}/{note_id_or_import_id}-{name}{original_ext}`
//!
//! where `name` is one of `original`, `thumbnail`, `crop3x2`, `crop4x3`,
//! `crop16x9`. Filesystem suffixes follow the same names: a source
//! `a.jpg` yields `a-original.jpg`, `a-thumbnail.jpg`, and so on under the
//! job's output directory.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::value_objects::{ImportId, NoteId};

/// The five derivatives of an imported image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivativeKind {
    Original,
    Thumbnail,
    Crop3x2,
    Crop4x3,
    Crop16x9,
}

impl DerivativeKind {
    /// All derivatives, in processing order.
    pub const ALL: [DerivativeKind; 5] = [
        DerivativeKind::Original,
        DerivativeKind::Thumbnail,
        DerivativeKind::Crop3x2,
        DerivativeKind::Crop4x3,
        DerivativeKind::Crop16x9,
    ];

    /// Wire-stable derivative name used in keys and filenames.
    pub fn as_str(&self) -> &'static str {
        match self {
            DerivativeKind::Original => "original",
            DerivativeKind::Thumbnail => "thumbnail",
            DerivativeKind::Crop3x2 => "crop3x2",
            DerivativeKind::Crop4x3 => "crop4x3",
            DerivativeKind::Crop16x9 => "crop16x9",
        }
    }

    /// Filename suffix, e.g. `-thumbnail`.
    pub fn suffix(&self) -> String {
        format!("-{}", self.as_str())
    }

    /// The target aspect ratio (width, height) for crops; `None` for the
    /// original and the thumbnail, which keep the source aspect.
    pub fn aspect_ratio(&self) -> Option<(u32, u32)> {
        match self {
            DerivativeKind::Original | DerivativeKind::Thumbnail => None,
            DerivativeKind::Crop3x2 => Some((3, 2)),
            DerivativeKind::Crop4x3 => Some((4, 3)),
            DerivativeKind::Crop16x9 => Some((16, 9)),
        }
    }
}

impl fmt::Display for DerivativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Splits a filename into `(stem, extension-with-dot)`.
///
/// A missing extension yields an empty extension string so key arithmetic
/// stays total; `photo` → `("photo", "")`, `a.jpg` → `("a", ".jpg")`.
pub fn split_filename(filename: &str) -> (String, String) {
    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (stem, ext)
}

/// Object-store key for an original upload.
///
/// `originals/{import_id}/{basename_without_ext}{original_ext}`
pub fn original_key(import_id: &ImportId, filename: &str) -> String {
    let (stem, ext) = split_filename(filename);
    format!("originals/{}/{}{}", import_id, stem, ext)
}

/// Object-store key for a processed derivative.
///
/// `processed/{import_id}/{note_id_or_import_id}-{name}{original_ext}`;
/// the note id is preferred when present, the import id stands in when the
/// note has not been assigned yet.
pub fn processed_key(
    import_id: &ImportId,
    note_id: Option<&NoteId>,
    kind: DerivativeKind,
    filename: &str,
) -> String {
    let (_, ext) = split_filename(filename);
    let owner = note_id
        .map(|n| n.as_str().to_string())
        .unwrap_or_else(|| import_id.as_str().to_string());
    format!("processed/{}/{}-{}{}", import_id, owner, kind.as_str(), ext)
}
