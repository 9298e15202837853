// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Action Context
//!
//! Immutable per-job metadata handed to every action in a pipeline run.
//!
//! The context is created exactly once per job invocation by the worker and
//! never mutated afterwards; actions receive it by shared reference. Its job
//! identifier doubles as the correlation field on every log line the
//! pipeline emits, so one invocation can be traced end to end across
//! actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{JobId, QueueName};

/// Immutable metadata describing one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionContext {
    job_id: JobId,
    attempt: u32,
    queue: QueueName,
    operation: String,
    started_at: DateTime<Utc>,
    worker: String,
}

impl ActionContext {
    /// Builds the context for one job invocation.
    ///
    /// `operation` names the logical pipeline (e.g. `image_processing`);
    /// `worker` identifies the consuming worker instance for log
    /// attribution.
    pub fn new(
        job_id: JobId,
        attempt: u32,
        queue: QueueName,
        operation: impl Into<String>,
        worker: impl Into<String>,
    ) -> Self {
        Self {
            job_id,
            attempt,
            queue,
            operation: operation.into(),
            started_at: Utc::now(),
            worker: worker.into(),
        }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Zero-based attempt number of the underlying job.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn queue(&self) -> QueueName {
        self.queue
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn worker(&self) -> &str {
        &self.worker
    }

    /// Wall-clock time elapsed since the context was created.
    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_captures_invocation_metadata() {
        let job_id = JobId::generate();
        let ctx = ActionContext::new(job_id, 2, QueueName::Image, "image_processing", "image-worker-1");
        assert_eq!(ctx.job_id(), job_id);
        assert_eq!(ctx.attempt(), 2);
        assert_eq!(ctx.queue(), QueueName::Image);
        assert_eq!(ctx.operation(), "image_processing");
        assert_eq!(ctx.worker(), "image-worker-1");
    }

    #[test]
    fn test_context_clones_are_equal() {
        let ctx = ActionContext::new(JobId::generate(), 0, QueueName::Notes, "note_import", "w");
        assert_eq!(ctx, ctx.clone());
    }
}
