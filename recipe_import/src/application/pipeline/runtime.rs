// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Runtime
//!
//! Executes an ordered list of actions for one job, threading each action's
//! output into the next action's input.
//!
//! ## Algorithm
//!
//! For actions `[A0, A1, ..., An-1]` and initial payload `d0`:
//!
//! 1. Call `Ai.validate_input(di)`; an error short-circuits the pipeline.
//! 2. Emit the start event `(ctx, Ai.name)`.
//! 3. Invoke `d(i+1) = Ai.execute(di, deps, ctx)` inside the error-handling
//!    wrapper, which classifies, logs, and attaches job/queue context.
//! 4. Emit the completion event `(ctx, Ai.name, elapsed)`.
//!
//! ## Ordering Guarantee
//!
//! Execution is strictly sequential within a pipeline - the runtime never
//! parallelizes steps, even logically independent ones. Downstream actions
//! may therefore assume every upstream side effect is visible. Concurrency
//! exists one level up: a worker runs many pipelines at once, each on its
//! own task.
//!
//! ## Error Semantics
//!
//! A non-retryable error short-circuits the pipeline and surfaces to the
//! queue as a terminal failure; every other error propagates and is subject
//! to the worker's retry policy. The runtime attaches the failing action's
//! name and the job's queue to the error before re-raising.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use recipe_import_domain::{ActionContext, ActionName, ImportError};

use crate::application::pipeline::action::BoxedAction;
use crate::application::pipeline::deps::WorkerDeps;

/// Receiver for pipeline lifecycle events.
///
/// Implementations must be cheap and non-blocking; the runtime invokes
/// them inline between actions. Metrics and test recorders implement this.
pub trait PipelineObserver: Send + Sync {
    fn on_action_started(&self, ctx: &ActionContext, action: ActionName);
    fn on_action_completed(&self, ctx: &ActionContext, action: ActionName, elapsed: Duration);
}

/// Executes action lists for single jobs.
pub struct PipelineRuntime<D>
where
    D: Send + 'static,
{
    observers: Vec<Arc<dyn PipelineObserver>>,
    _payload: std::marker::PhantomData<fn(D) -> D>,
}

impl<D> PipelineRuntime<D>
where
    D: Send + 'static,
{
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
            _payload: std::marker::PhantomData,
        }
    }

    /// Attaches a lifecycle observer.
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Runs the pipeline to completion, returning the final payload.
    pub async fn run(
        &self,
        actions: &[BoxedAction<D>],
        mut data: D,
        deps: &WorkerDeps,
        ctx: &ActionContext,
    ) -> Result<D, ImportError> {
        debug!(
            job_id = %ctx.job_id(),
            queue = %ctx.queue(),
            operation = ctx.operation(),
            actions = actions.len(),
            "pipeline starting"
        );

        for action in actions {
            let name = action.name();

            action.validate_input(&data).map_err(|e| {
                deps.error_handler.log(&e, ctx, name);
                e.with_job_context(ctx.queue().as_str(), ctx.job_id().to_string(), name.as_str())
            })?;

            for observer in &self.observers {
                observer.on_action_started(ctx, name);
            }
            debug!(job_id = %ctx.job_id(), action = %name, "action starting");

            let started = Instant::now();
            data = deps
                .error_handler
                .with_error_handling(action.execute(data, deps, ctx), ctx, name)
                .await?;
            let elapsed = started.elapsed();

            for observer in &self.observers {
                observer.on_action_completed(ctx, name, elapsed);
            }
            debug!(
                job_id = %ctx.job_id(),
                action = %name,
                elapsed_ms = elapsed.as_millis() as u64,
                "action completed"
            );
        }

        info!(
            job_id = %ctx.job_id(),
            queue = %ctx.queue(),
            operation = ctx.operation(),
            "pipeline completed"
        );
        Ok(data)
    }
}

impl<D> Default for PipelineRuntime<D>
where
    D: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
