// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Job Envelope
//!
//! The unit pulled from a queue: an opaque identifier, a queue-specific
//! payload, and an attempt counter. The queue owns the envelope while it is
//! enqueued and is the only party that mutates the attempt counter; the
//! executing worker owns it exclusively during processing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::value_objects::JobId;
use crate::ImportError;

/// One queued unit of work carrying a payload of type `P`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job<P> {
    id: JobId,
    payload: P,
    attempt: u32,
    priority: i32,
    enqueued_at: DateTime<Utc>,
}

impl<P> Job<P> {
    /// Wraps a payload in a fresh envelope with attempt zero.
    pub fn new(payload: P) -> Self {
        Self {
            id: JobId::generate(),
            payload,
            attempt: 0,
            priority: 0,
            enqueued_at: Utc::now(),
        }
    }

    /// Envelope with an explicit priority (higher pops first).
    pub fn with_priority(payload: P, priority: i32) -> Self {
        Self {
            priority,
            ..Self::new(payload)
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Consumes the envelope, yielding the payload.
    pub fn into_payload(self) -> P {
        self.payload
    }

    /// Zero-based attempt counter; incremented by the queue on reschedule.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }

    /// Next-attempt envelope for a reschedule: same id and payload, attempt
    /// counter bumped. Queue-internal.
    pub fn into_retry(mut self) -> Self {
        self.attempt += 1;
        self
    }
}

/// Options accepted by `push`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushOptions {
    /// Higher priorities pop first within a queue.
    pub priority: i32,
    /// Initial visibility delay before the job may be pulled.
    pub delay: Option<Duration>,
}

impl PushOptions {
    pub fn with_priority(priority: i32) -> Self {
        Self {
            priority,
            delay: None,
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            priority: 0,
            delay: Some(delay),
        }
    }
}

/// Options accepted by `pull`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullOptions {
    /// Maximum jobs processed concurrently by this consumer.
    pub concurrency: usize,
}

impl Default for PullOptions {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

/// The worker's verdict on a processed job, returned to the queue.
#[derive(Debug)]
pub enum JobDisposition {
    /// Terminal success; the queue drops the job.
    Ack,
    /// Recoverable failure; the queue re-enqueues after the given delay
    /// with the attempt counter bumped.
    RetryAfter(Duration),
    /// Terminal failure; the queue drops the job and records the error.
    Discard(ImportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_job_starts_at_attempt_zero() {
        let job = Job::new("payload");
        assert_eq!(job.attempt(), 0);
        assert_eq!(job.priority(), 0);
    }

    #[test]
    fn test_retry_preserves_identity() {
        let job = Job::new("payload");
        let id = job.id();
        let retried = job.into_retry();
        assert_eq!(retried.id(), id);
        assert_eq!(retried.attempt(), 1);
        assert_eq!(retried.payload(), &"payload");
    }

    #[test]
    fn test_priority_envelope() {
        let job = Job::with_priority("p", 5);
        assert_eq!(job.priority(), 5);
    }
}
