// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Signal Handling
//!
//! Wires OS termination signals to the shutdown coordinator. Ctrl-C is
//! handled on every platform; SIGTERM additionally on Unix (the signal
//! container orchestrators send first).

use crate::shutdown::ShutdownCoordinator;

/// Spawns a background task that initiates shutdown on the first
/// termination signal received.
///
/// A second signal while draining is deliberately not escalated here; the
/// grace period already bounds the wait.
pub fn spawn_signal_listener(coordinator: ShutdownCoordinator) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_termination().await;
        tracing::info!("termination signal received");
        coordinator.initiate_shutdown();
    })
}

#[cfg(unix)]
async fn wait_for_termination() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!(error = %e, "failed to install SIGTERM handler; falling back to Ctrl-C only");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_termination() {
    let _ = tokio::signal::ctrl_c().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_listener_spawns_and_aborts_cleanly() {
        let coordinator = ShutdownCoordinator::default();
        let handle = spawn_signal_listener(coordinator.clone());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!coordinator.is_shutting_down());
        handle.abort();
    }
}
