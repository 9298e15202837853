// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Job envelope and per-queue payload types.
//!
//! The platform keeps payloads strictly typed: each queue carries exactly
//! one payload type and each worker instantiates the generic pipeline
//! machinery concretely over it. There is no loose union threaded through
//! the runtime.

pub mod image_job;
pub mod job;
pub mod payloads;

pub use image_job::{DerivativeSlot, ImageJobData, ImageMetadata};
pub use job::{Job, JobDisposition, PullOptions, PushOptions};
pub use payloads::{
    CategorizationJobData, IngredientJobData, InstructionJobData, NoteJobData, SourceJobData,
};
