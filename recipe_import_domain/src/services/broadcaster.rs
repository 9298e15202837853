// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Status Broadcaster Port
//!
//! Fire-and-forget event sink toward the ingestion channel. `emit` returns
//! a completion signal so callers can log a failed delivery, but no caller
//! ever fails its own operation on a broadcast error - the invariant every
//! pipeline relies on.

use async_trait::async_trait;

use crate::events::StatusEvent;
use crate::ImportError;

/// Pushes progress events to the ingestion channel.
#[async_trait]
pub trait StatusBroadcaster: Send + Sync {
    /// Delivers one event. Errors are for the caller's log line only.
    async fn emit(&self, event: StatusEvent) -> Result<(), ImportError>;
}
