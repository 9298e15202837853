// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Note Repository Port
//!
//! Persistence contract for notes and their refined ingredient and
//! instruction lines. The notes pipeline saves the note before any fan-out
//! job is enqueued; downstream pipelines update their lines independently.

use async_trait::async_trait;

use crate::entities::{IngredientLine, InstructionLine, NoteRecord};
use crate::value_objects::{ImportId, NoteId};
use crate::ImportError;

/// Typed persistence operations for notes.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Persists a note keyed by its import id (upsert), returning its id.
    async fn save(&self, note: &NoteRecord) -> Result<NoteId, ImportError>;

    /// Fetches a note by id.
    async fn find_by_id(&self, note_id: &NoteId) -> Result<Option<NoteRecord>, ImportError>;

    /// Fetches a note by its import id.
    async fn find_by_import_id(&self, import_id: &ImportId) -> Result<Option<NoteRecord>, ImportError>;

    /// Persists one refined ingredient line (upsert on note id + index).
    async fn save_ingredient(&self, line: &IngredientLine) -> Result<(), ImportError>;

    /// Persists one formatted instruction line (upsert on note id + index).
    async fn save_instruction(&self, line: &InstructionLine) -> Result<(), ImportError>;

    /// Records the category assigned to a note.
    async fn set_category(&self, note_id: &NoteId, category: &str) -> Result<(), ImportError>;
}
