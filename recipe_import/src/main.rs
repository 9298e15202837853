// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Recipe Import Worker Platform
//!
//! Binary entry point: parse the command line, load configuration,
//! initialize logging, dispatch the command, and translate the outcome
//! into a process exit code. Everything substantive lives in the library
//! crates; this file stays thin so the platform is equally usable
//! embedded in other binaries and in tests.

use clap::Parser;

use recipe_import::infrastructure::config::AppConfig;
use recipe_import::presentation::cli::{run_import, run_serve, run_status, Cli, Command};
use recipe_import_bootstrap::ExitCode;

fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(mut config) => {
            if let Some(level) = &cli.log_level {
                config.log_level = level.clone();
            }
            config
        }
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(ExitCode::ConfigError.code());
        }
    };

    if let Err(e) = recipe_import_bootstrap::init_tracing(&config.log_level, config.log_json) {
        eprintln!("logging setup failed: {e}");
        std::process::exit(ExitCode::RuntimeError.code());
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("failed to start async runtime: {e}");
            std::process::exit(ExitCode::RuntimeError.code());
        }
    };

    let result = runtime.block_on(async {
        match cli.command {
            Command::Serve => run_serve(config).await,
            Command::Import { file, import_id } => run_import(config, file, import_id).await,
            Command::Status => run_status(config).await,
        }
    });

    match result {
        Ok(code) => std::process::exit(code.code()),
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            std::process::exit(ExitCode::RuntimeError.code());
        }
    }
}
