// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Job Queue Port
//!
//! The abstract queue backend contract. One queue carries exactly one
//! payload type; workers register a [`JobHandler`] through `pull` and the
//! backend drives delivery, attempt accounting, and rescheduling from the
//! handler's [`JobDisposition`](crate::jobs::JobDisposition) verdicts.
//!
//! ## Ownership
//!
//! A job is exclusively owned by the queue while enqueued and by the
//! executing worker during processing. Only the queue mutates the attempt
//! counter.
//!
//! ## Delivery Semantics
//!
//! At-least-once within the process: a handler that returns `RetryAfter`
//! sees the same job id again with a bumped attempt counter. No ordering
//! guarantees beyond priority-then-FIFO are part of the contract.

use async_trait::async_trait;
use std::sync::Arc;

use crate::jobs::{Job, JobDisposition, PullOptions, PushOptions};
use crate::value_objects::{JobId, QueueName};
use crate::ImportError;

/// Consumer callback invoked once per delivered job.
///
/// Handlers must be safe to call concurrently up to the consumer's
/// configured ceiling; any shared state is the handler's own concern.
#[async_trait]
pub trait JobHandler<P>: Send + Sync
where
    P: Send + 'static,
{
    /// Processes one job and reports its disposition to the queue.
    ///
    /// This method never returns a raw error: every failure is folded into
    /// a [`JobDisposition`] so the queue can apply retry policy uniformly.
    async fn handle(&self, job: Job<P>) -> JobDisposition;
}

/// The abstract queue backend, one instance per queue name.
#[async_trait]
pub trait JobQueue<P>: Send + Sync
where
    P: Send + 'static,
{
    /// The queue this backend instance serves.
    fn name(&self) -> QueueName;

    /// Enqueues a payload, returning the minted job id.
    async fn push(&self, payload: P, opts: PushOptions) -> Result<JobId, ImportError>;

    /// Begins consuming with the given handler and concurrency ceiling.
    ///
    /// Returns once the consumer loop is installed; delivery happens on
    /// backend-owned tasks. A second `pull` on the same queue is an error.
    async fn pull(&self, handler: Arc<dyn JobHandler<P>>, opts: PullOptions) -> Result<(), ImportError>;

    /// Liveness probe for the health monitor.
    async fn ping(&self) -> Result<(), ImportError>;

    /// Number of jobs currently enqueued (excluding in-flight).
    fn depth(&self) -> usize;

    /// Stops delivery, letting in-flight jobs finish, and releases backend
    /// resources. Idempotent.
    async fn close(&self) -> Result<(), ImportError>;
}
