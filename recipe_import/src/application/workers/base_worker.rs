// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Base Worker
//!
//! Adapts one queue's job stream to the pipeline runtime.
//!
//! ## Per-Job Flow
//!
//! 1. Receive a job from the queue.
//! 2. Consult the health monitor; an unhealthy process rejects the job
//!    with a retryable `ServiceUnhealthy` error, returning it to the queue
//!    without marking it failed.
//! 3. Build the immutable [`ActionContext`] from the job and the worker
//!    identity.
//! 4. Call the pipeline builder - builders are free to inspect the payload
//!    to specialize the action list.
//! 5. Run the pipeline runtime.
//! 6. Ack on success; on failure consult retry policy to choose between
//!    reschedule and terminal failure, invoking the terminal-failure
//!    handler (if configured) before discarding.
//!
//! ## Concurrency
//!
//! The worker pulls up to its configured ceiling in parallel; each
//! concurrent job runs its pipeline on its own task with no shared mutable
//! state beyond the explicitly shared collaborators in the dependency
//! bundle. In-flight pipelines are tracked through the shutdown
//! coordinator's drain gauge, so `stop` lets them finish while new pulls
//! cease immediately.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use recipe_import_bootstrap::ShutdownCoordinator;
use recipe_import_domain::services::{JobHandler, JobQueue};
use recipe_import_domain::{
    ActionContext, ImportError, Job, JobDisposition, PullOptions,
};

use crate::application::pipeline::{ActionFactory, BoxedAction, PipelineRuntime, WorkerDeps};
use crate::application::services::health::HealthMonitor;

/// Builds the action list for one job. May inspect the payload.
pub type PipelineBuilder<D> = Arc<
    dyn Fn(&D, &ActionContext, &ActionFactory<D>, &WorkerDeps) -> Result<Vec<BoxedAction<D>>, ImportError>
        + Send
        + Sync,
>;

/// Hook invoked once per terminally failed job, before it is discarded.
///
/// The image worker uses this to run its failure-path action (record to
/// `failed`, FAILED broadcast). Implementations are best-effort and must
/// not raise.
#[async_trait]
pub trait TerminalFailureHandler<D>: Send + Sync
where
    D: Send + 'static,
{
    async fn on_terminal_failure(
        &self,
        data: D,
        error: &ImportError,
        deps: &WorkerDeps,
        ctx: &ActionContext,
    );
}

/// Management surface shared by all workers, whatever their payload type.
#[async_trait]
pub trait ManagedWorker: Send + Sync {
    fn name(&self) -> &str;
    async fn start(&self) -> Result<(), ImportError>;
    async fn stop(&self) -> Result<(), ImportError>;
    fn is_running(&self) -> bool;
}

struct WorkerCore<D>
where
    D: Clone + Send + Sync + 'static,
{
    name: String,
    operation: String,
    queue: Arc<dyn JobQueue<D>>,
    deps: WorkerDeps,
    factory: Arc<ActionFactory<D>>,
    builder: PipelineBuilder<D>,
    runtime: PipelineRuntime<D>,
    health: Arc<HealthMonitor>,
    shutdown: ShutdownCoordinator,
    failure_handler: parking_lot::RwLock<Option<Arc<dyn TerminalFailureHandler<D>>>>,
}

/// One queue bound to one pipeline.
pub struct BaseWorker<D>
where
    D: Clone + Send + Sync + 'static,
{
    core: Arc<WorkerCore<D>>,
    concurrency: usize,
    running: AtomicBool,
}

impl<D> BaseWorker<D>
where
    D: Clone + Send + Sync + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        operation: impl Into<String>,
        queue: Arc<dyn JobQueue<D>>,
        deps: WorkerDeps,
        factory: Arc<ActionFactory<D>>,
        builder: PipelineBuilder<D>,
        runtime: PipelineRuntime<D>,
        health: Arc<HealthMonitor>,
        shutdown: ShutdownCoordinator,
        concurrency: usize,
    ) -> Self {
        Self {
            core: Arc::new(WorkerCore {
                name: name.into(),
                operation: operation.into(),
                queue,
                deps,
                factory,
                builder,
                runtime,
                health,
                shutdown,
                failure_handler: parking_lot::RwLock::new(None),
            }),
            concurrency: concurrency.max(1),
            running: AtomicBool::new(false),
        }
    }

    /// Installs the terminal-failure hook.
    pub fn with_failure_handler(self, handler: Arc<dyn TerminalFailureHandler<D>>) -> Self {
        *self.core.failure_handler.write() = Some(handler);
        self
    }
}

struct CoreHandler<D>
where
    D: Clone + Send + Sync + 'static,
{
    core: Arc<WorkerCore<D>>,
}

#[async_trait]
impl<D> JobHandler<D> for CoreHandler<D>
where
    D: Clone + Send + Sync + 'static,
{
    async fn handle(&self, job: Job<D>) -> JobDisposition {
        let core = &self.core;
        let _drain_guard = core.shutdown.track_job();
        let queue_name = core.queue.name();
        let attempt = job.attempt();
        let started = Instant::now();
        core.deps.metrics.job_started(queue_name);

        // Health gate: degraded processes bounce jobs back to the queue.
        if !core.health.is_healthy().await {
            let err = ImportError::service_unhealthy(format!(
                "worker {} rejecting job: dependencies degraded",
                core.name
            ));
            warn!(
                worker = %core.name,
                queue = %queue_name,
                job_id = %job.id(),
                attempt,
                error = %err,
                "job rejected by health gate"
            );
            let delay = core.deps.error_handler.backoff(attempt);
            core.deps.metrics.job_finished(queue_name, "retried", started.elapsed());
            return JobDisposition::RetryAfter(delay);
        }

        let ctx = ActionContext::new(
            job.id(),
            attempt,
            queue_name,
            core.operation.clone(),
            core.name.clone(),
        );
        let payload = job.into_payload();
        let failure_seed = payload.clone();

        let result = match (core.builder)(&payload, &ctx, &core.factory, &core.deps) {
            Ok(actions) => core.runtime.run(&actions, payload, &core.deps, &ctx).await,
            Err(e) => Err(ImportError::worker(format!(
                "worker {} failed to build pipeline: {e}",
                core.name
            ))),
        };

        match result {
            Ok(_) => {
                core.deps
                    .metrics
                    .job_finished(queue_name, "completed", started.elapsed());
                JobDisposition::Ack
            }
            Err(e) => {
                if core.deps.error_handler.should_retry(&e, attempt) {
                    let delay = core.deps.error_handler.backoff(attempt);
                    warn!(
                        worker = %core.name,
                        job_id = %ctx.job_id(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "job will be retried"
                    );
                    core.deps
                        .metrics
                        .job_finished(queue_name, "retried", started.elapsed());
                    JobDisposition::RetryAfter(delay)
                } else {
                    let failure_handler = core.failure_handler.read().clone();
                    if let Some(handler) = failure_handler {
                        handler
                            .on_terminal_failure(failure_seed, &e, &core.deps, &ctx)
                            .await;
                    }
                    core.deps
                        .metrics
                        .job_finished(queue_name, "failed", started.elapsed());
                    JobDisposition::Discard(e)
                }
            }
        }
    }
}

#[async_trait]
impl<D> ManagedWorker for BaseWorker<D>
where
    D: Clone + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.core.name
    }

    async fn start(&self) -> Result<(), ImportError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ImportError::worker(format!(
                "worker {} is already running",
                self.core.name
            )));
        }
        let handler = Arc::new(CoreHandler {
            core: Arc::clone(&self.core),
        });
        self.core
            .queue
            .pull(
                handler,
                PullOptions {
                    concurrency: self.concurrency,
                },
            )
            .await?;
        info!(
            worker = %self.core.name,
            queue = %self.core.queue.name(),
            concurrency = self.concurrency,
            "worker started"
        );
        Ok(())
    }

    async fn stop(&self) -> Result<(), ImportError> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        info!(worker = %self.core.name, "worker stopping");
        // Closing the queue ceases delivery; in-flight pipelines finish
        // under the shutdown coordinator's drain gauge.
        self.core.queue.close().await
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
