// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Worker layer: the generic queue-to-pipeline adapter, the factory
//! constructing one worker per queue, and the manager running them as a
//! group.

pub mod base_worker;
pub mod factory;
pub mod manager;

pub use base_worker::{BaseWorker, ManagedWorker, PipelineBuilder, TerminalFailureHandler};
pub use factory::WorkerFactory;
pub use manager::WorkerManager;
