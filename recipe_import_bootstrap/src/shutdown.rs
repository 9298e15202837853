// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Shutdown Coordination
//!
//! Graceful shutdown for the worker fleet: a cancellation token workers
//! watch to stop pulling, a drain gauge counting in-flight pipelines, and a
//! grace period bounding how long the process waits for the gauge to reach
//! zero.
//!
//! ## Drain Semantics
//!
//! Workers cease pulling the moment the token cancels, but in-flight
//! pipelines run to completion - there is no mid-pipeline cancellation.
//! Each pipeline invocation holds a [`DrainGuard`]; shutdown completes when
//! the last guard drops or the grace period expires, whichever comes first.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Default grace period for graceful shutdown (in seconds)
pub const DEFAULT_GRACE_PERIOD_SECS: u64 = 30;

/// Cancellation token signaling that pulls must stop.
///
/// Lightweight, clone-able, safe to hand to every worker task.
#[derive(Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancellationToken {
    fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Cancel this token, waking all waiters.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Check cancellation without blocking.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Wait until cancelled.
    pub async fn cancelled(&self) {
        while !self.is_cancelled() {
            let notified = self.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// RAII guard representing one in-flight pipeline.
///
/// Dropping the guard decrements the drain gauge and wakes the shutdown
/// waiter when the gauge reaches zero.
pub struct DrainGuard {
    in_flight: Arc<AtomicUsize>,
    drained: Arc<Notify>,
}

impl Drop for DrainGuard {
    fn drop(&mut self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.drained.notify_waiters();
        }
    }
}

/// Shutdown coordinator for the whole process.
///
/// Owns the cancellation token, the in-flight gauge, and the grace period.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    grace_period: Duration,
    shutdown_initiated: Arc<AtomicBool>,
    in_flight: Arc<AtomicUsize>,
    drained: Arc<Notify>,
}

impl ShutdownCoordinator {
    pub fn new(grace_period: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            grace_period,
            shutdown_initiated: Arc::new(AtomicBool::new(false)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            drained: Arc::new(Notify::new()),
        }
    }

    /// A token for worker tasks to watch.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Registers one in-flight pipeline; hold the guard for its duration.
    pub fn track_job(&self) -> DrainGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        DrainGuard {
            in_flight: Arc::clone(&self.in_flight),
            drained: Arc::clone(&self.drained),
        }
    }

    /// Pipelines currently in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_initiated.load(Ordering::SeqCst)
    }

    /// Initiates shutdown: sets the flag and cancels every token.
    /// Idempotent; only the first call logs.
    pub fn initiate_shutdown(&self) {
        if self
            .shutdown_initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            tracing::info!(
                grace_period = ?self.grace_period,
                in_flight = self.in_flight(),
                "initiating graceful shutdown"
            );
            self.token.cancel();
        }
    }

    /// Waits for all in-flight pipelines to drain or the grace period to
    /// expire. Returns `true` on a clean drain, `false` on timeout.
    pub async fn wait_for_drain(&self) -> bool {
        if !self.is_shutting_down() {
            tracing::warn!("wait_for_drain called before shutdown was initiated");
            return true;
        }

        let deadline = tokio::time::Instant::now() + self.grace_period;
        loop {
            if self.in_flight() == 0 {
                tracing::info!("all in-flight jobs drained");
                return true;
            }
            let notified = self.drained.notified();
            if self.in_flight() == 0 {
                return true;
            }
            tokio::select! {
                _ = notified => {}
                _ = tokio::time::sleep_until(deadline) => {
                    tracing::warn!(
                        in_flight = self.in_flight(),
                        "shutdown grace period expired with jobs still in flight"
                    );
                    return false;
                }
            }
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_GRACE_PERIOD_SECS))
    }
}
