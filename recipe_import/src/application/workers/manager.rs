// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Worker Manager
//!
//! Holds the full worker set and runs its group lifecycle: `start_all`
//! starts workers in their fixed construction order and aborts on the
//! first failure; `stop_all` stops every worker concurrently with
//! settle-all semantics, logging individual failures and resolving only
//! once every stop has resolved.

use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

use recipe_import_domain::ImportError;

use crate::application::workers::base_worker::ManagedWorker;

pub struct WorkerManager {
    workers: Vec<Arc<dyn ManagedWorker>>,
}

impl WorkerManager {
    pub fn new(workers: Vec<Arc<dyn ManagedWorker>>) -> Self {
        Self { workers }
    }

    /// Starts every worker in order; the first failure aborts the sweep
    /// and is raised to the caller.
    pub async fn start_all(&self) -> Result<(), ImportError> {
        for worker in &self.workers {
            worker.start().await.map_err(|e| {
                error!(worker = worker.name(), error = %e, "worker failed to start");
                e
            })?;
        }
        info!(workers = self.workers.len(), "all workers started");
        Ok(())
    }

    /// Stops every worker concurrently. One worker's failure does not
    /// abort the others; failures are logged and the call resolves once
    /// every stop future has settled.
    pub async fn stop_all(&self) {
        let stops = self.workers.iter().map(|worker| {
            let worker = Arc::clone(worker);
            async move {
                let name = worker.name().to_string();
                (name, worker.stop().await)
            }
        });

        for (name, result) in join_all(stops).await {
            if let Err(e) = result {
                error!(worker = %name, error = %e, "worker failed to stop");
            }
        }
        info!("all workers stopped");
    }

    /// Running-flag snapshot per worker name.
    pub fn status(&self) -> BTreeMap<String, bool> {
        self.workers
            .iter()
            .map(|w| (w.name().to_string(), w.is_running()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}
