// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Service Ports
//!
//! Trait interfaces for the external collaborators every worker shares: the
//! job queue backend, the object store, the status broadcaster, the image
//! processor, the note parser, and health probes. Implementations live in
//! the infrastructure layer; the domain defines only the contracts.
//!
//! These ports are async because they wrap I/O. Pure domain services (key
//! arithmetic, retry policy, state machines) are sync and live with their
//! value objects.

pub mod broadcaster;
pub mod health;
pub mod image_processor;
pub mod job_queue;
pub mod note_parser;
pub mod object_store;

pub use broadcaster::StatusBroadcaster;
pub use health::HealthProbe;
pub use image_processor::{DerivativeOutput, ImageProcessor, ProcessedImage};
pub use job_queue::{JobHandler, JobQueue};
pub use note_parser::{NoteParser, ParsedImageRef, ParsedNote};
pub use object_store::{ObjectStore, StoredObject};
