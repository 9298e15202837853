// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Queue Payloads
//!
//! The payload types for every queue other than the image queue (whose
//! payload lives in its own module). One type per queue; each worker
//! instantiates the generic machinery concretely over its payload.

use serde::{Deserialize, Serialize};

use crate::services::note_parser::ParsedNote;
use crate::value_objects::{ImportId, NoteId};

/// Payload of a notes-queue job: one HTML blob to parse, persist, and fan
/// out from.
///
/// The trailing optional fields are assigned mid-pipeline (the save step
/// fills them for the fan-out step) and are absent on the wire from
/// producers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteJobData {
    pub import_id: ImportId,
    pub html: String,
    pub source_url: Option<String>,
    /// Local directory holding image files referenced by the note, when the
    /// ingestion side staged them on disk.
    pub staged_image_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_id: Option<NoteId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed: Option<ParsedNote>,
}

impl NoteJobData {
    pub fn new(import_id: ImportId, html: impl Into<String>) -> Self {
        Self {
            import_id,
            html: html.into(),
            source_url: None,
            staged_image_dir: None,
            note_id: None,
            parsed: None,
        }
    }
}

/// Payload of an ingredients-queue job: one raw ingredient line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientJobData {
    pub note_id: NoteId,
    pub import_id: ImportId,
    /// Zero-based line position within the note.
    pub line_index: u32,
    pub raw: String,
}

/// Payload of an instruction-queue job: one raw instruction line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionJobData {
    pub note_id: NoteId,
    pub import_id: ImportId,
    /// Zero-based line position within the note.
    pub line_index: u32,
    pub text: String,
}

/// Payload of a categorization-queue job: one persisted note to classify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizationJobData {
    pub note_id: NoteId,
    pub import_id: ImportId,
}

/// Payload of a source-queue job: one location to acquire note HTML from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceJobData {
    pub import_id: ImportId,
    /// Filesystem path (or URL, for remote sources) of the HTML blob.
    pub location: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_payload_roundtrips_through_json() {
        let payload = NoteJobData::new(ImportId::new("i1").unwrap(), "<html/>");
        let json = serde_json::to_string(&payload).unwrap();
        let back: NoteJobData = serde_json::from_str(&json).unwrap();
        assert_eq!(payload, back);
    }

    #[test]
    fn test_ingredient_payload_shape() {
        let payload = IngredientJobData {
            note_id: NoteId::new("n1").unwrap(),
            import_id: ImportId::new("i1").unwrap(),
            line_index: 3,
            raw: "1 tbsp olive oil".to_string(),
        };
        assert_eq!(payload.line_index, 3);
    }
}
