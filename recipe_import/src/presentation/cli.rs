// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface
//!
//! Three commands:
//!
//! - `serve` - run all queue workers until interrupted (SIGINT/SIGTERM),
//!   with the WebSocket status broadcaster listening
//! - `import <file>` - one-shot: run the workers in-process, stage the
//!   given HTML file through the source queue, wait for the import to
//!   drain, print a summary, and exit
//! - `status` - print queue depths and aggregate health for the
//!   configured database/queues

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use recipe_import_bootstrap::{signals, ExitCode};
use recipe_import_domain::jobs::SourceJobData;
use recipe_import_domain::{ImportError, ImportId, PushOptions};

use crate::application::services::container::ServiceContainer;
use crate::application::workers::{WorkerFactory, WorkerManager};
use crate::infrastructure::config::AppConfig;

#[derive(Debug, Parser)]
#[command(
    name = "recipe-import",
    version,
    about = "Background job processing platform for recipe imports"
)]
pub struct Cli {
    /// Path to a configuration file (default: ./recipe-import.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level directive override (e.g. "debug", "recipe_import=trace")
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run all queue workers until interrupted
    Serve,
    /// Import one staged note HTML file and exit
    Import {
        /// Path to the staged note HTML
        file: PathBuf,
        /// Import identifier (generated when absent)
        #[arg(long)]
        import_id: Option<String>,
    },
    /// Print queue depths and health
    Status,
}

/// How long a one-shot import may take before it is abandoned.
const IMPORT_DRAIN_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs the workers until a termination signal arrives.
pub async fn run_serve(config: AppConfig) -> Result<ExitCode, ImportError> {
    let container = ServiceContainer::build(config).await?;
    container.start_ws_broadcaster().await?;

    let workers = WorkerFactory::new(Arc::clone(&container)).build_all()?;
    let manager = WorkerManager::new(workers);
    manager.start_all().await?;

    let shutdown = container.shutdown().clone();
    signals::spawn_signal_listener(shutdown.clone());
    info!("workers serving; send SIGINT or SIGTERM to stop");

    shutdown.token().cancelled().await;

    manager.stop_all().await;
    let drained = shutdown.wait_for_drain().await;
    container.close().await?;

    Ok(if drained {
        ExitCode::Success
    } else {
        ExitCode::ShutdownTimeout
    })
}

/// One-shot import of a staged note file.
pub async fn run_import(
    config: AppConfig,
    file: PathBuf,
    import_id: Option<String>,
) -> Result<ExitCode, ImportError> {
    let import_id = match import_id {
        Some(id) => ImportId::new(id)?,
        None => ImportId::generate(),
    };

    let container = ServiceContainer::build(config).await?;
    let workers = WorkerFactory::new(Arc::clone(&container)).build_all()?;
    let manager = WorkerManager::new(workers);
    manager.start_all().await?;

    let payload = SourceJobData {
        import_id: import_id.clone(),
        location: file.to_string_lossy().into_owned(),
    };
    container
        .queues()
        .source
        .push(payload, PushOptions::default())
        .await?;
    info!(import_id = %import_id, file = %file.display(), "import enqueued");

    let drained = wait_for_drain(&container, IMPORT_DRAIN_TIMEOUT).await;

    manager.stop_all().await;
    container.shutdown().initiate_shutdown();
    container.shutdown().wait_for_drain().await;

    let summary = container
        .notes_repository()
        .find_by_import_id(&import_id)
        .await?;
    container.close().await?;

    match summary {
        Some(note) => {
            println!("imported \"{}\" as note {}", note.title, note.note_id);
            if let Some(category) = note.category {
                println!("category: {category}");
            }
            Ok(if drained { ExitCode::Success } else { ExitCode::ShutdownTimeout })
        }
        None => {
            eprintln!("import {import_id} did not produce a note (see logs)");
            Ok(ExitCode::RuntimeError)
        }
    }
}

/// Prints queue depths and aggregate health.
pub async fn run_status(config: AppConfig) -> Result<ExitCode, ImportError> {
    let container = ServiceContainer::build(config).await?;
    let healthy = container.health().check_now().await;

    println!("health: {}", if healthy { "ok" } else { "degraded" });
    for (queue, depth) in container.queue_depths() {
        println!("{queue:>15}: {depth} queued");
    }
    container.close().await?;
    Ok(ExitCode::Success)
}

/// Polls until every queue is empty and no note is mid-fan-out, or the
/// timeout elapses. Includes a settle window so freshly enqueued
/// downstream jobs are observed.
async fn wait_for_drain(container: &ServiceContainer, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    let mut quiet_sweeps = 0u32;
    while tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(250)).await;
        let queued: usize = container.queue_depths().iter().map(|(_, d)| d).sum();
        let tracked = container.completion().tracked_notes();
        if queued == 0 && tracked == 0 && container.shutdown().in_flight() == 0 {
            quiet_sweeps += 1;
            // Two consecutive quiet sweeps: fan-out edges had a chance to
            // enqueue follow-ups.
            if quiet_sweeps >= 2 {
                return true;
            }
        } else {
            quiet_sweeps = 0;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_import_command_shape() {
        let cli = Cli::parse_from(["recipe-import", "import", "note.html", "--import-id", "i1"]);
        match cli.command {
            Command::Import { file, import_id } => {
                assert_eq!(file, PathBuf::from("note.html"));
                assert_eq!(import_id.as_deref(), Some("i1"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
