// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Note Parser Port
//!
//! Structural extraction from an incoming HTML blob: title, ingredient
//! lines, instruction lines, and image references. Parsing is synchronous
//! CPU work; failures are terminal (a malformed note does not become
//! parseable on retry).

use serde::{Deserialize, Serialize};

use crate::ImportError;

/// An image referenced by a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedImageRef {
    /// Local staged path or remote URL, as found in the note.
    pub location: String,
    pub filename: String,
}

/// The structured content extracted from one note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedNote {
    pub title: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub images: Vec<ParsedImageRef>,
}

/// Extracts structured note content from HTML.
pub trait NoteParser: Send + Sync {
    fn parse(&self, html: &str) -> Result<ParsedNote, ImportError>;
}
