// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Recipe Import
//!
//! A background job processing platform for a recipe-import application.
//! Notes arrive as HTML blobs, are parsed and persisted, then decomposed
//! into independent downstream pipelines: ingredient parsing, instruction
//! formatting, image derivative generation, and categorization.
//!
//! ## Architecture Overview
//!
//! The platform follows Clean Architecture and Domain-Driven Design
//! principles:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Presentation Layer                       │
//! │  (CLI: serve / import / status)                             │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Application Layer                         │
//! │  (Pipeline Runtime, Workers, Actions, Completion Tracker,   │
//! │   Error Handler, Health Monitor, Service Container)         │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                            │
//! │  (recipe_import_domain: entities, value objects, payloads,  │
//! │   events, service and repository ports)                     │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Infrastructure Layer                       │
//! │  (In-Memory Queue, SQLite, Object Store, WebSocket          │
//! │   Broadcast, Image Processing, Config, Metrics)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Core Concepts
//!
//! ### Workers and Queues
//! One worker per queue (`notes`, `ingredients`, `instruction`, `image`,
//! `categorization`, `source`), each consuming with its own concurrency
//! ceiling. Within a job, actions run strictly sequentially; across jobs
//! a worker is fully concurrent.
//!
//! ### Action Pipelines
//! Each job runs an ordered list of named actions sharing a dependency
//! bundle and an immutable per-job context. Actions classify their
//! failures as recoverable (retried with exponential backoff), fatal
//! (terminal), or skippable (logged and swallowed - uploads, cleanup,
//! broadcasting).
//!
//! ### Fan-Out and Completion Tracking
//! The notes pipeline persists the note, then fans out image, ingredient,
//! and instruction jobs. A process-wide tracker ref-counts completions
//! per note and fires terminal events exactly once, deduplicating by
//! `(note, category, job)`.
//!
//! ### Image Pipeline
//! The most elaborate pipeline: best-effort original upload, derivative
//! generation (thumbnail plus 3:2 / 4:3 / 16:9 center crops), isolated
//! concurrent derivative uploads, an atomic record upsert keyed by the
//! import id, best-effort local cleanup, and two-step completion
//! signaling.

pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use application::pipeline::{Action, ActionFactory, PipelineRuntime, WorkerDeps};
pub use application::services::{
    CompletionCategory, CompletionTracker, ErrorHandler, HealthMonitor, ServiceContainer,
};
pub use application::workers::{BaseWorker, ManagedWorker, WorkerFactory, WorkerManager};
pub use infrastructure::config::AppConfig;
