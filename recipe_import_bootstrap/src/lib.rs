// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Recipe Import Bootstrap
//!
//! Process-level plumbing for the worker platform: logging initialization,
//! shutdown coordination, and OS signal handling. Kept in its own crate so
//! the application layer stays free of platform concerns and the entry
//! point stays thin.
//!
//! ## Responsibilities
//!
//! - **Logging**: tracing-subscriber initialization (compact or JSON) and a
//!   minimal [`logger::BootstrapLogger`] abstraction for the pre-tracing
//!   window
//! - **Shutdown**: [`shutdown::ShutdownCoordinator`] with cancellation
//!   tokens, an in-flight drain gauge, and a bounded grace period
//! - **Signals**: SIGINT/SIGTERM (Ctrl-C on all platforms) wired to the
//!   coordinator
//! - **Exit codes**: the small closed set the binary reports

pub mod logger;
pub mod shutdown;
pub mod signals;

pub use logger::{BootstrapLogger, ConsoleLogger, NoOpLogger};
pub use shutdown::{CancellationToken, DrainGuard, ShutdownCoordinator};

/// Process exit codes reported by the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    /// Configuration could not be loaded or validated.
    ConfigError = 2,
    /// A worker failed to construct or start.
    StartupError = 3,
    /// Shutdown grace period expired with jobs still in flight.
    ShutdownTimeout = 4,
    /// Unhandled runtime failure.
    RuntimeError = 10,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Initializes the tracing subscriber for the whole process.
///
/// `level` is an `EnvFilter` directive (e.g. `info`,
/// `recipe_import=debug,info`); `json` switches the format for log
/// shippers. Respects `RUST_LOG` when set, falling back to the given
/// directive.
pub fn init_tracing(level: &str, json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to init tracing: {e}"))?;
    } else {
        fmt()
            .compact()
            .with_env_filter(filter)
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to init tracing: {e}"))?;
    }
    Ok(())
}
