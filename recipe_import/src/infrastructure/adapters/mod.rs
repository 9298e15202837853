// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Concrete adapters for the domain service ports: derivative generation,
//! object storage, and note parsing.

pub mod derivative_generator;
pub mod fs_object_store;
pub mod note_parser;
pub mod remote_object_store;

pub use derivative_generator::DerivativeGenerator;
pub use fs_object_store::FsObjectStore;
pub use note_parser::HeuristicNoteParser;
pub use remote_object_store::RemoteObjectStore;
