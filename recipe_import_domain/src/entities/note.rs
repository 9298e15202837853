// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Note Aggregate
//!
//! The persisted note produced by the notes pipeline, together with the
//! ingredient and instruction lines its downstream pipelines refine. The
//! note is saved before any fan-out job is enqueued, so every downstream
//! worker can rely on the record existing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{ImportId, NoteId};

/// One imported note as persisted by the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub note_id: NoteId,
    pub import_id: ImportId,
    pub title: String,
    pub source_url: Option<String>,
    /// Raw HTML the note was parsed from; retained for re-parsing variants.
    pub html: String,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NoteRecord {
    pub fn new(
        note_id: NoteId,
        import_id: ImportId,
        title: impl Into<String>,
        html: impl Into<String>,
        source_url: Option<String>,
    ) -> Self {
        Self {
            note_id,
            import_id,
            title: title.into(),
            source_url,
            html: html.into(),
            category: None,
            created_at: Utc::now(),
        }
    }
}

/// One ingredient line of a note, refined by the ingredients pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientLine {
    pub note_id: NoteId,
    /// Zero-based position within the note.
    pub index: u32,
    pub raw: String,
    pub parsed_name: Option<String>,
    pub parsed_quantity: Option<String>,
    pub parsed_unit: Option<String>,
}

impl IngredientLine {
    pub fn raw_line(note_id: NoteId, index: u32, raw: impl Into<String>) -> Self {
        Self {
            note_id,
            index,
            raw: raw.into(),
            parsed_name: None,
            parsed_quantity: None,
            parsed_unit: None,
        }
    }
}

/// One instruction line of a note, formatted by the instruction pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionLine {
    pub note_id: NoteId,
    /// Zero-based position within the note.
    pub index: u32,
    pub text: String,
}

impl InstructionLine {
    pub fn new(note_id: NoteId, index: u32, text: impl Into<String>) -> Self {
        Self {
            note_id,
            index,
            text: text.into(),
        }
    }
}
