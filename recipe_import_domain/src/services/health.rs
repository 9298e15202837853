// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Health Probe Port
//!
//! One liveness check per subordinate dependency (database ping, queue
//! backend ping, optional object-store reachability). The health monitor
//! aggregates probes and gates job admission on the result.

use async_trait::async_trait;

use crate::ImportError;

/// A single liveness check.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Probe name for logs and status output.
    fn name(&self) -> &str;

    /// Returns `Ok` when the dependency is reachable and serving.
    async fn check(&self) -> Result<(), ImportError>;
}
