// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Repository ports for the persisted aggregates. The database owns the
//! records; these traits expose typed upsert/update/find operations and all
//! failures surface as `DATABASE` errors.

pub mod image_repository;
pub mod note_repository;

pub use image_repository::ImageRepository;
pub use note_repository::NoteRepository;
