// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Database Schema
//!
//! Connection setup and schema bootstrap for the SQLite store. The image
//! table carries a unique index on `import_id` - the invariant the
//! atomic upsert in the image repository relies on.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

use recipe_import_domain::services::HealthProbe;
use recipe_import_domain::ImportError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS notes (
    note_id     TEXT PRIMARY KEY,
    import_id   TEXT NOT NULL UNIQUE,
    title       TEXT NOT NULL,
    source_url  TEXT,
    html        TEXT NOT NULL,
    category    TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS note_ingredients (
    note_id         TEXT NOT NULL,
    line_index      INTEGER NOT NULL,
    raw             TEXT NOT NULL,
    parsed_name     TEXT,
    parsed_quantity TEXT,
    parsed_unit     TEXT,
    PRIMARY KEY (note_id, line_index)
);

CREATE TABLE IF NOT EXISTS note_instructions (
    note_id    TEXT NOT NULL,
    line_index INTEGER NOT NULL,
    text       TEXT NOT NULL,
    PRIMARY KEY (note_id, line_index)
);

CREATE TABLE IF NOT EXISTS images (
    image_id            TEXT PRIMARY KEY,
    note_id             TEXT,
    import_id           TEXT NOT NULL,
    original_image_url  TEXT,
    thumbnail_image_url TEXT,
    crop3x2_image_url   TEXT,
    crop4x3_image_url   TEXT,
    crop16x9_image_url  TEXT,
    original_width      INTEGER,
    original_height     INTEGER,
    original_size       INTEGER,
    original_format     TEXT,
    processing_status   TEXT NOT NULL DEFAULT 'PENDING',
    processing_error    TEXT,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_images_import_id ON images (import_id);
CREATE INDEX IF NOT EXISTS idx_images_note_id ON images (note_id);
"#;

/// Opens (and creates, if needed) the SQLite database at the given path.
///
/// `":memory:"` yields an in-memory database, used by tests. Every pool
/// connection to a plain in-memory URL would get its own empty database,
/// so the in-memory pool is pinned to a single persistent connection.
pub async fn connect(database_path: &str) -> Result<SqlitePool, ImportError> {
    let in_memory = database_path == ":memory:";
    let url = if in_memory {
        "sqlite::memory:".to_string()
    } else {
        format!("sqlite://{database_path}")
    };
    let options = SqliteConnectOptions::from_str(&url)
        .map_err(|e| ImportError::database(format!("invalid database path: {e}")))?
        .create_if_missing(true);

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    pool_options
        .connect_with(options)
        .await
        .map_err(|e| ImportError::database(format!("failed to open database: {e}")))
}

/// Creates all tables and indexes if they do not exist.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), ImportError> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| ImportError::database(format!("failed to apply schema: {e}")))?;
    Ok(())
}

/// Database liveness probe for the health monitor.
pub struct DatabaseProbe {
    pool: SqlitePool,
}

impl DatabaseProbe {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthProbe for DatabaseProbe {
    fn name(&self) -> &str {
        "database"
    }

    async fn check(&self) -> Result<(), ImportError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| ImportError::database(format!("database ping failed: {e}")))?;
        Ok(())
    }
}
