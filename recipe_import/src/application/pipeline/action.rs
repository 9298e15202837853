// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Action Contract
//!
//! One narrowly scoped step of a pipeline. Actions are the only place
//! business work happens inside a worker; everything around them (ordering,
//! validation, events, error wrapping, retry) belongs to the runtime.
//!
//! ## Contract
//!
//! - `name` is a stable identifier from the closed
//!   [`ActionName`] enumeration
//! - `validate_input` is a cheap structural check the runtime calls before
//!   execution; a returned error short-circuits the pipeline
//! - `execute` consumes the payload and returns the (possibly transformed)
//!   payload for the next action
//!
//! ## Guarantees
//!
//! Actions are deterministic given `(data, deps, ctx)` modulo their
//! intended side effects. They never mutate `deps` or `ctx`, and they
//! return a new payload value rather than mutating state a predecessor
//! still observes. Returning the received payload unchanged is a valid
//! no-op transformation.
//!
//! ## Failure Classes
//!
//! Every action folds its failures into one of three classes:
//!
//! - **recoverable** - raise an error whose type is retryable; the worker
//!   consults retry policy
//! - **fatal** - raise an error whose type is non-retryable (validation,
//!   parsing, worker); the job fails terminally
//! - **skippable** - log the failure and return success; used by the
//!   best-effort upload and cleanup steps whose failures must never fail a
//!   pipeline

use async_trait::async_trait;
use std::sync::Arc;

use recipe_import_domain::{ActionContext, ActionName, ImportError};

use crate::application::pipeline::deps::WorkerDeps;

/// One step of a pipeline over payload type `D`.
#[async_trait]
pub trait Action<D>: Send + Sync
where
    D: Send + 'static,
{
    /// Stable identifier from the closed action-name set.
    fn name(&self) -> ActionName;

    /// Cheap structural precondition check; default accepts everything.
    fn validate_input(&self, _data: &D) -> Result<(), ImportError> {
        Ok(())
    }

    /// Performs the work, returning the payload for the next action.
    async fn execute(
        &self,
        data: D,
        deps: &WorkerDeps,
        ctx: &ActionContext,
    ) -> Result<D, ImportError>;
}

/// Shared handle to an action instance.
pub type BoxedAction<D> = Arc<dyn Action<D>>;

/// Validates that the listed string fields of a payload are non-empty,
/// naming the first missing one.
///
/// Helper for `validate_input` implementations: pass pairs of
/// `(field_name, value)` and the first absent or blank one becomes the
/// error message.
pub fn require_fields(fields: &[(&str, Option<&str>)]) -> Result<(), ImportError> {
    for (name, value) in fields {
        match value {
            Some(v) if !v.trim().is_empty() => {}
            _ => return Err(ImportError::missing_field(*name)),
        }
    }
    Ok(())
}
