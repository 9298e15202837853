// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The per-job pipeline machinery: the action contract, the per-worker
//! action factory, and the runtime that executes an ordered action list for
//! one job.

pub mod action;
pub mod deps;
pub mod factory;
pub mod runtime;

pub use action::{require_fields, Action, BoxedAction};
pub use deps::{BroadcasterSlot, QueueSet, WorkerDeps};
pub use factory::{ActionConstructor, ActionFactory};
pub use runtime::{PipelineObserver, PipelineRuntime};
