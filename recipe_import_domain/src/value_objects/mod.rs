// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Value Objects
//!
//! Immutable, validated value types for the import domain. Identifier
//! newtypes keep note/import/job/image ids from being confused with one
//! another or with raw strings; the queue and action name enums pin the
//! closed sets the whole platform dispatches on; the retry policy and
//! derivative kinds capture small pieces of domain arithmetic that would
//! otherwise be scattered through the workers.

pub mod action_name;
pub mod derivative;
pub mod identifiers;
pub mod queue_name;
pub mod retry_policy;

pub use action_name::ActionName;
pub use derivative::DerivativeKind;
pub use identifiers::{ImageId, ImportId, JobId, NoteId};
pub use queue_name::QueueName;
pub use retry_policy::RetryPolicy;
