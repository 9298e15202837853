// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Image Record
//!
//! The persisted representation of one imported image, keyed by its import
//! identifier (the natural unique key the persistence step upserts on) with
//! a surrogate [`ImageId`] assigned on first insert.
//!
//! ## State Machine
//!
//! ```text
//! pending ──► processing ──► completed
//!                       └──► failed
//! ```
//!
//! `pending` is the state at upsert time before the pipeline runs;
//! `processing` is entered when the pipeline starts; `completed` and
//! `failed` are terminal. Illegal transitions are rejected by
//! [`ProcessingStatus::can_transition_to`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::value_objects::{DerivativeKind, ImageId, ImportId, NoteId};
use crate::ImportError;

/// Processing lifecycle of a persisted image record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    /// Wire/database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "PENDING",
            ProcessingStatus::Processing => "PROCESSING",
            ProcessingStatus::Completed => "COMPLETED",
            ProcessingStatus::Failed => "FAILED",
        }
    }

    /// Whether this status permits a transition to `next`.
    ///
    /// Same-state writes are allowed (status updates are idempotent);
    /// terminal states permit no further movement.
    pub fn can_transition_to(&self, next: ProcessingStatus) -> bool {
        if *self == next {
            return true;
        }
        match self {
            ProcessingStatus::Pending => next == ProcessingStatus::Processing,
            ProcessingStatus::Processing => {
                next == ProcessingStatus::Completed || next == ProcessingStatus::Failed
            }
            ProcessingStatus::Completed | ProcessingStatus::Failed => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingStatus::Completed | ProcessingStatus::Failed)
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProcessingStatus {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ProcessingStatus::Pending),
            "PROCESSING" => Ok(ProcessingStatus::Processing),
            "COMPLETED" => Ok(ProcessingStatus::Completed),
            "FAILED" => Ok(ProcessingStatus::Failed),
            other => Err(ImportError::validation(format!(
                "unknown processing status: {other:?}"
            ))),
        }
    }
}

/// One imported image as persisted by the database.
///
/// In-memory copies are read-only snapshots; the database owns the record.
/// URLs hold whatever the persistence step resolved - remote object-store
/// URLs when uploads succeeded, locally served `/images/...` URLs
/// otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Surrogate key; `None` until the first upsert returns.
    pub image_id: Option<ImageId>,
    pub note_id: Option<NoteId>,
    /// Natural unique key: the upsert conflict target.
    pub import_id: ImportId,
    pub original_image_url: Option<String>,
    pub thumbnail_image_url: Option<String>,
    pub crop3x2_image_url: Option<String>,
    pub crop4x3_image_url: Option<String>,
    pub crop16x9_image_url: Option<String>,
    pub original_width: Option<u32>,
    pub original_height: Option<u32>,
    pub original_size: Option<u64>,
    pub original_format: Option<String>,
    pub processing_status: ProcessingStatus,
    pub processing_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ImageRecord {
    /// A fresh `pending` record for an import, before the pipeline runs.
    pub fn pending(import_id: ImportId, note_id: Option<NoteId>) -> Self {
        let now = Utc::now();
        Self {
            image_id: None,
            note_id,
            import_id,
            original_image_url: None,
            thumbnail_image_url: None,
            crop3x2_image_url: None,
            crop4x3_image_url: None,
            crop16x9_image_url: None,
            original_width: None,
            original_height: None,
            original_size: None,
            original_format: None,
            processing_status: ProcessingStatus::Pending,
            processing_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The persisted URL for a derivative kind.
    pub fn url_for(&self, kind: DerivativeKind) -> Option<&str> {
        match kind {
            DerivativeKind::Original => self.original_image_url.as_deref(),
            DerivativeKind::Thumbnail => self.thumbnail_image_url.as_deref(),
            DerivativeKind::Crop3x2 => self.crop3x2_image_url.as_deref(),
            DerivativeKind::Crop4x3 => self.crop4x3_image_url.as_deref(),
            DerivativeKind::Crop16x9 => self.crop16x9_image_url.as_deref(),
        }
    }

    /// Sets the persisted URL for a derivative kind.
    pub fn set_url(&mut self, kind: DerivativeKind, url: impl Into<String>) {
        let url = Some(url.into());
        match kind {
            DerivativeKind::Original => self.original_image_url = url,
            DerivativeKind::Thumbnail => self.thumbnail_image_url = url,
            DerivativeKind::Crop3x2 => self.crop3x2_image_url = url,
            DerivativeKind::Crop4x3 => self.crop4x3_image_url = url,
            DerivativeKind::Crop16x9 => self.crop16x9_image_url = url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_state_machine() {
        use ProcessingStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Processing));
        assert!(!Failed.can_transition_to(Processing));
        assert!(Completed.can_transition_to(Completed));
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            ProcessingStatus::Pending,
            ProcessingStatus::Processing,
            ProcessingStatus::Completed,
            ProcessingStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<ProcessingStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_pending_record_shape() {
        let record = ImageRecord::pending(ImportId::new("i1").unwrap(), None);
        assert_eq!(record.processing_status, ProcessingStatus::Pending);
        assert!(record.image_id.is_none());
        assert!(record.processing_error.is_none());
        for kind in DerivativeKind::ALL {
            assert!(record.url_for(kind).is_none());
        }
    }

    #[test]
    fn test_url_accessors() {
        let mut record = ImageRecord::pending(ImportId::new("i1").unwrap(), None);
        record.set_url(DerivativeKind::Thumbnail, "https://cdn/x-thumbnail.jpg");
        assert_eq!(
            record.url_for(DerivativeKind::Thumbnail),
            Some("https://cdn/x-thumbnail.jpg")
        );
        assert!(record.url_for(DerivativeKind::Crop3x2).is_none());
    }
}
