// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Recipe Import Domain
//!
//! Pure domain layer for the recipe-import worker platform: the business
//! rules of background note processing, expressed without any runtime,
//! database, or network dependency.
//!
//! ## Architecture Overview
//!
//! The platform follows Clean Architecture and Domain-Driven Design
//! principles. This crate is the innermost layer:
//!
//! - **Value Objects**: validated identifiers, the closed queue and action
//!   name sets, derivative kinds with their key arithmetic, retry policy
//! - **Entities**: the per-job action context, the persisted image record
//!   and its state machine, the note aggregate
//! - **Jobs**: the queue envelope and the strictly typed per-queue payloads
//! - **Events**: the status-event schema of the ingestion channel
//! - **Service Ports**: async trait contracts for the queue backend, object
//!   store, broadcaster, image processor, note parser, and health probes
//! - **Repository Ports**: typed persistence contracts for notes and image
//!   records
//! - **Errors**: the unified [`ImportError`] taxonomy with category,
//!   severity, and retryability
//!
//! ## Core Concepts
//!
//! ### Pipelines and Actions
//! Every job is processed by an ordered sequence of named actions. The
//! action names form a closed set ([`value_objects::ActionName`]) so
//! factories, logs, and tests share stable literals.
//!
//! ### Fan-Out and Completion
//! The notes pipeline persists a note, then enqueues image, ingredient,
//! instruction, and categorization jobs. Downstream completions are
//! ref-counted per note; terminal events fire exactly once.
//!
//! ### Best-Effort Boundaries
//! Object-store uploads, local cleanup, broadcasting, and completion
//! tracking are deliberately non-fatal: their failures are logged and the
//! pipeline continues. The domain expresses this through optional payload
//! fields rather than silent exception swallowing.

pub mod entities;
pub mod error;
pub mod events;
pub mod jobs;
pub mod repositories;
pub mod services;
pub mod value_objects;

// Crate-root re-exports for the types nearly every consumer needs.
pub use entities::{ActionContext, ImageRecord, ProcessingStatus};
pub use error::{ErrorCategory, ErrorSeverity, ImportError};
pub use events::{EventContext, ImportStatus, StatusEvent};
pub use jobs::{ImageJobData, Job, JobDisposition, PullOptions, PushOptions};
pub use value_objects::{
    ActionName, DerivativeKind, ImageId, ImportId, JobId, NoteId, QueueName, RetryPolicy,
};
