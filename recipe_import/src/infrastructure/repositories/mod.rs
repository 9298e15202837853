// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed repository implementations.

pub mod schema;
pub mod sqlite_image_repository;
pub mod sqlite_note_repository;

pub use schema::{connect, ensure_schema, DatabaseProbe};
pub use sqlite_image_repository::SqliteImageRepository;
pub use sqlite_note_repository::SqliteNoteRepository;
