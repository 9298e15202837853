// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Application Configuration
//!
//! Typed configuration for the worker platform, loaded by layering:
//!
//! 1. Built-in defaults (the values below)
//! 2. An optional `recipe-import.toml` file
//! 3. `RECIPE_IMPORT_*` environment variables (double underscore as the
//!    section separator, e.g. `RECIPE_IMPORT_QUEUES__IMAGE__CONCURRENCY=8`)
//!
//! ## Recognized Options
//!
//! | Option | Default |
//! |---|---|
//! | `port` (HTTP ingestion) | `4200` |
//! | `ws_port` (broadcaster) | `8080` |
//! | `batch_size` | `10` |
//! | `max_retries` | `3` |
//! | `base_backoff_ms` | `1000` |
//! | `max_backoff_ms` | `30000` |
//! | `image_base_url` | `http://localhost:4200` |
//! | `database_path` | `recipe-import.db` |
//! | `output_dir` | `./processed` |
//! | `[queues.<name>] concurrency` | `4` (categorization `1`) |
//! | `[object_store]` | absent (uploads skipped) |

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use recipe_import_domain::{ImportError, QueueName, RetryPolicy};

/// Per-queue tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueTuning {
    /// Concurrency ceiling for this queue's worker.
    pub concurrency: usize,
}

/// Object-store connection settings. Absent entirely when the platform
/// runs without remote storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    pub bucket: String,
    /// S3-compatible endpoint URL; native AWS when absent.
    pub endpoint: Option<String>,
    pub region: Option<String>,
    /// Base URL uploaded keys are publicly served from.
    pub public_base_url: String,
}

/// The process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP ingestion port (served by the ingestion edge, not this
    /// process; recorded here so local URLs resolve consistently).
    pub port: u16,
    /// WebSocket broadcaster port.
    pub ws_port: u16,
    /// Maximum jobs fetched per dispatcher sweep.
    pub batch_size: usize,
    pub max_retries: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// URL prefix for locally served images when no object store is
    /// configured.
    pub image_base_url: String,
    pub database_path: String,
    /// Directory derivative files are written under, per import.
    pub output_dir: PathBuf,
    pub log_level: String,
    pub log_json: bool,
    /// Shutdown drain budget in seconds.
    pub shutdown_grace_secs: u64,
    pub queues: BTreeMap<String, QueueTuning>,
    pub object_store: Option<ObjectStoreConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut queues = BTreeMap::new();
        for queue in QueueName::ALL {
            queues.insert(
                queue.as_str().to_string(),
                QueueTuning {
                    concurrency: if queue == QueueName::Categorization { 1 } else { 4 },
                },
            );
        }
        Self {
            port: 4200,
            ws_port: 8080,
            batch_size: 10,
            max_retries: 3,
            base_backoff_ms: 1_000,
            max_backoff_ms: 30_000,
            image_base_url: "http://localhost:4200".to_string(),
            database_path: "recipe-import.db".to_string(),
            output_dir: PathBuf::from("./processed"),
            log_level: "info".to_string(),
            log_json: false,
            shutdown_grace_secs: 30,
            queues,
            object_store: None,
        }
    }
}

impl AppConfig {
    /// Loads configuration from defaults, an optional file, and the
    /// environment, then validates it.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ImportError> {
        let mut builder = Config::builder();

        let defaults = Config::try_from(&AppConfig::default())
            .map_err(|e| ImportError::invalid_config(format!("defaults failed to serialize: {e}")))?;
        builder = builder.add_source(defaults);

        match config_file {
            Some(path) => builder = builder.add_source(File::from(path)),
            None => builder = builder.add_source(File::with_name("recipe-import").required(false)),
        }

        builder = builder.add_source(
            Environment::with_prefix("RECIPE_IMPORT")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .map_err(|e| ImportError::invalid_config(format!("failed to load configuration: {e}")))?
            .try_deserialize()
            .map_err(|e| ImportError::invalid_config(format!("invalid configuration: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Structural validation of loaded values.
    pub fn validate(&self) -> Result<(), ImportError> {
        if self.batch_size == 0 {
            return Err(ImportError::invalid_config("batch_size must be positive"));
        }
        if self.base_backoff_ms == 0 {
            return Err(ImportError::invalid_config("base_backoff_ms must be positive"));
        }
        if self.max_backoff_ms < self.base_backoff_ms {
            return Err(ImportError::invalid_config(
                "max_backoff_ms must be at least base_backoff_ms",
            ));
        }
        if self.image_base_url.trim().is_empty() {
            return Err(ImportError::invalid_config("image_base_url must not be empty"));
        }
        for (name, tuning) in &self.queues {
            name.parse::<QueueName>()
                .map_err(|_| ImportError::invalid_config(format!("unknown queue section: {name}")))?;
            if tuning.concurrency == 0 {
                return Err(ImportError::invalid_config(format!(
                    "queue {name}: concurrency must be positive"
                )));
            }
        }
        if let Some(store) = &self.object_store {
            if store.bucket.trim().is_empty() {
                return Err(ImportError::invalid_config("object_store.bucket must not be empty"));
            }
            if store.public_base_url.trim().is_empty() {
                return Err(ImportError::invalid_config(
                    "object_store.public_base_url must not be empty",
                ));
            }
        }
        Ok(())
    }

    /// The retry policy derived from the backoff settings.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.base_backoff_ms, self.max_backoff_ms)
    }

    /// Concurrency ceiling for a queue's worker.
    pub fn concurrency_for(&self, queue: QueueName) -> usize {
        self.queues
            .get(queue.as_str())
            .map(|t| t.concurrency)
            .unwrap_or(if queue == QueueName::Categorization { 1 } else { 4 })
    }

    /// The locally served URL for an image file name.
    pub fn local_image_url(&self, basename: &str) -> String {
        format!("{}/images/{}", self.image_base_url.trim_end_matches('/'), basename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_contract() {
        let config = AppConfig::default();
        assert_eq!(config.port, 4200);
        assert_eq!(config.ws_port, 8080);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_backoff_ms, 1_000);
        assert_eq!(config.max_backoff_ms, 30_000);
        assert!(config.object_store.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_concurrency_per_queue() {
        let config = AppConfig::default();
        assert_eq!(config.concurrency_for(QueueName::Image), 4);
        assert_eq!(config.concurrency_for(QueueName::Categorization), 1);
    }

    #[test]
    fn test_validation_rejects_zero_batch() {
        let config = AppConfig {
            batch_size: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_inverted_backoff() {
        let config = AppConfig {
            base_backoff_ms: 60_000,
            max_backoff_ms: 1_000,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_queue_section() {
        let mut config = AppConfig::default();
        config.queues.insert("imagez".to_string(), QueueTuning { concurrency: 2 });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_local_image_url_shape() {
        let config = AppConfig {
            image_base_url: "http://localhost:4200/".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(
            config.local_image_url("a-thumbnail.jpg"),
            "http://localhost:4200/images/a-thumbnail.jpg"
        );
    }

    #[test]
    fn test_retry_policy_reflects_settings() {
        let config = AppConfig {
            max_retries: 5,
            base_backoff_ms: 500,
            max_backoff_ms: 8_000,
            ..AppConfig::default()
        };
        let policy = config.retry_policy();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_backoff_ms, 500);
        assert_eq!(policy.max_backoff_ms, 8_000);
    }
}
