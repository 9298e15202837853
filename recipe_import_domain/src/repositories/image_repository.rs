// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Image Repository Port
//!
//! Persistence contract for image records. The import id is the natural
//! unique key: `upsert` targets it with a single atomic
//! insert-or-update (never find-then-insert, which races under concurrent
//! delivery of the same import).

use async_trait::async_trait;

use crate::entities::{ImageRecord, ProcessingStatus};
use crate::value_objects::{ImageId, ImportId, NoteId};
use crate::ImportError;

/// Typed persistence operations for image records.
#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Inserts or updates the record keyed by its import id.
    ///
    /// On conflict the URLs, dimensions, size, format, status, and error
    /// fields are replaced and the note id is synchronized; on insert the
    /// note and import ids are set as given. Returns the surrogate image
    /// id (newly assigned on insert, existing on update).
    async fn upsert(&self, record: &ImageRecord) -> Result<ImageId, ImportError>;

    /// Updates processing status (and error message) by surrogate key.
    async fn update_status(
        &self,
        image_id: &ImageId,
        status: ProcessingStatus,
        processing_error: Option<&str>,
    ) -> Result<(), ImportError>;

    /// Marks the record for an import as failed with the given message.
    ///
    /// Used by the failure path, which may run before a surrogate id was
    /// ever assigned; a missing record is not an error.
    async fn mark_failed(&self, import_id: &ImportId, message: &str) -> Result<(), ImportError>;

    /// Fetches the record for an import, if any.
    async fn find_by_import_id(&self, import_id: &ImportId) -> Result<Option<ImageRecord>, ImportError>;

    /// All records belonging to a note.
    async fn find_by_note_id(&self, note_id: &NoteId) -> Result<Vec<ImageRecord>, ImportError>;
}
