// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Status Events
//!
//! The event schema pushed to the ingestion channel: progress and terminal
//! notifications keyed by import and note, with a nesting level for display
//! and a free-form metadata map for payload-specific details (preview URLs,
//! counts, error strings).
//!
//! Broadcasting is fire-and-forget from the emitter's point of view:
//! callers may log a failed emit but never fail their own operation on it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::value_objects::{ImportId, NoteId};

/// Progress state carried by a status event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStatus {
    Processing,
    Completed,
    Failed,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Processing => "PROCESSING",
            ImportStatus::Completed => "COMPLETED",
            ImportStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The pipeline context an event originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventContext {
    Import,
    NoteProcessing,
    ImageProcessing,
    IngredientProcessing,
    InstructionProcessing,
    Categorization,
    Source,
}

impl EventContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventContext::Import => "import",
            EventContext::NoteProcessing => "note_processing",
            EventContext::ImageProcessing => "image_processing",
            EventContext::IngredientProcessing => "ingredient_processing",
            EventContext::InstructionProcessing => "instruction_processing",
            EventContext::Categorization => "categorization",
            EventContext::Source => "source",
        }
    }
}

impl fmt::Display for EventContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One event on the ingestion channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub import_id: ImportId,
    pub note_id: Option<NoteId>,
    pub status: ImportStatus,
    pub message: String,
    pub context: EventContext,
    /// Display nesting depth; top-level import events are zero.
    pub indent_level: u8,
    /// Free-form event details; ordered map for stable serialization.
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl StatusEvent {
    /// A bare event with empty metadata at indent level zero.
    pub fn new(
        import_id: ImportId,
        note_id: Option<NoteId>,
        status: ImportStatus,
        context: EventContext,
        message: impl Into<String>,
    ) -> Self {
        Self {
            import_id,
            note_id,
            status,
            message: message.into(),
            context,
            indent_level: 0,
            metadata: BTreeMap::new(),
        }
    }

    /// Sets the display nesting depth.
    pub fn with_indent(mut self, indent_level: u8) -> Self {
        self.indent_level = indent_level;
        self
    }

    /// Attaches one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_builder() {
        let event = StatusEvent::new(
            ImportId::new("i1").unwrap(),
            Some(NoteId::new("n1").unwrap()),
            ImportStatus::Processing,
            EventContext::ImageProcessing,
            "image processed",
        )
        .with_indent(2)
        .with_metadata("thumbnail_url", serde_json::json!("https://r2/t.jpg"));

        assert_eq!(event.indent_level, 2);
        assert_eq!(event.context.as_str(), "image_processing");
        assert_eq!(
            event.metadata.get("thumbnail_url"),
            Some(&serde_json::json!("https://r2/t.jpg"))
        );
    }

    #[test]
    fn test_status_wire_form() {
        assert_eq!(ImportStatus::Processing.as_str(), "PROCESSING");
        assert_eq!(ImportStatus::Completed.as_str(), "COMPLETED");
        assert_eq!(ImportStatus::Failed.as_str(), "FAILED");
    }

    #[test]
    fn test_event_serializes_with_stable_keys() {
        let event = StatusEvent::new(
            ImportId::new("i1").unwrap(),
            None,
            ImportStatus::Failed,
            EventContext::Import,
            "boom",
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["status"], "FAILED");
        assert_eq!(json["context"], "import");
        assert!(json["note_id"].is_null());
    }
}
