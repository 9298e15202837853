// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # SQLite Image Repository
//!
//! Persistence for image records. The upsert is a single atomic
//! `INSERT ... ON CONFLICT(import_id) DO UPDATE ... RETURNING image_id`
//! against the unique index on the import id; concurrent deliveries of the
//! same import converge on one row without a find-then-insert race.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use recipe_import_domain::entities::{ImageRecord, ProcessingStatus};
use recipe_import_domain::repositories::ImageRepository;
use recipe_import_domain::value_objects::{ImageId, ImportId, NoteId};
use recipe_import_domain::ImportError;

pub struct SqliteImageRepository {
    pool: SqlitePool,
}

impl SqliteImageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ImageRecord, ImportError> {
        let status: String = row.get("processing_status");
        let note_id: Option<String> = row.get("note_id");
        let note_id = note_id
            .map(NoteId::new)
            .transpose()
            .map_err(|e| ImportError::database(format!("corrupt note_id column: {e}")))?;
        Ok(ImageRecord {
            image_id: Some(
                ImageId::new(row.get::<String, _>("image_id"))
                    .map_err(|e| ImportError::database(format!("corrupt image_id column: {e}")))?,
            ),
            note_id,
            import_id: ImportId::new(row.get::<String, _>("import_id"))
                .map_err(|e| ImportError::database(format!("corrupt import_id column: {e}")))?,
            original_image_url: row.get("original_image_url"),
            thumbnail_image_url: row.get("thumbnail_image_url"),
            crop3x2_image_url: row.get("crop3x2_image_url"),
            crop4x3_image_url: row.get("crop4x3_image_url"),
            crop16x9_image_url: row.get("crop16x9_image_url"),
            original_width: row.get::<Option<i64>, _>("original_width").map(|v| v as u32),
            original_height: row.get::<Option<i64>, _>("original_height").map(|v| v as u32),
            original_size: row.get::<Option<i64>, _>("original_size").map(|v| v as u64),
            original_format: row.get("original_format"),
            processing_status: status
                .parse()
                .map_err(|_| ImportError::database(format!("corrupt processing_status: {status}")))?,
            processing_error: row.get("processing_error"),
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
            updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
        })
    }
}

#[async_trait]
impl ImageRepository for SqliteImageRepository {
    async fn upsert(&self, record: &ImageRecord) -> Result<ImageId, ImportError> {
        let candidate_id = record
            .image_id
            .clone()
            .unwrap_or_else(ImageId::generate);
        let now = Utc::now();

        let row = sqlx::query(
            r#"
            INSERT INTO images (
                image_id, note_id, import_id,
                original_image_url, thumbnail_image_url,
                crop3x2_image_url, crop4x3_image_url, crop16x9_image_url,
                original_width, original_height, original_size, original_format,
                processing_status, processing_error,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(import_id) DO UPDATE SET
                note_id             = excluded.note_id,
                original_image_url  = excluded.original_image_url,
                thumbnail_image_url = excluded.thumbnail_image_url,
                crop3x2_image_url   = excluded.crop3x2_image_url,
                crop4x3_image_url   = excluded.crop4x3_image_url,
                crop16x9_image_url  = excluded.crop16x9_image_url,
                original_width      = excluded.original_width,
                original_height     = excluded.original_height,
                original_size       = excluded.original_size,
                original_format     = excluded.original_format,
                processing_status   = excluded.processing_status,
                processing_error    = excluded.processing_error,
                updated_at          = excluded.updated_at
            RETURNING image_id
            "#,
        )
        .bind(candidate_id.as_str())
        .bind(record.note_id.as_ref().map(|n| n.as_str()))
        .bind(record.import_id.as_str())
        .bind(&record.original_image_url)
        .bind(&record.thumbnail_image_url)
        .bind(&record.crop3x2_image_url)
        .bind(&record.crop4x3_image_url)
        .bind(&record.crop16x9_image_url)
        .bind(record.original_width.map(|v| v as i64))
        .bind(record.original_height.map(|v| v as i64))
        .bind(record.original_size.map(|v| v as i64))
        .bind(&record.original_format)
        .bind(record.processing_status.as_str())
        .bind(&record.processing_error)
        .bind(record.created_at)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ImportError::database(format!("failed to upsert image record: {e}")))?;

        let image_id = ImageId::new(row.get::<String, _>("image_id"))
            .map_err(|e| ImportError::database(format!("corrupt image_id column: {e}")))?;
        debug!(import_id = %record.import_id, image_id = %image_id, "image record upserted");
        Ok(image_id)
    }

    async fn update_status(
        &self,
        image_id: &ImageId,
        status: ProcessingStatus,
        processing_error: Option<&str>,
    ) -> Result<(), ImportError> {
        let result = sqlx::query(
            "UPDATE images SET processing_status = ?, processing_error = ?, updated_at = ? \
             WHERE image_id = ?",
        )
        .bind(status.as_str())
        .bind(processing_error)
        .bind(Utc::now())
        .bind(image_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| ImportError::database(format!("failed to update image status: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(ImportError::NotFound(format!("image record {image_id}")));
        }
        Ok(())
    }

    async fn mark_failed(&self, import_id: &ImportId, message: &str) -> Result<(), ImportError> {
        sqlx::query(
            "UPDATE images SET processing_status = ?, processing_error = ?, updated_at = ? \
             WHERE import_id = ?",
        )
        .bind(ProcessingStatus::Failed.as_str())
        .bind(message)
        .bind(Utc::now())
        .bind(import_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| ImportError::database(format!("failed to mark image failed: {e}")))?;
        // No row is fine: the failure may precede the first upsert.
        Ok(())
    }

    async fn find_by_import_id(
        &self,
        import_id: &ImportId,
    ) -> Result<Option<ImageRecord>, ImportError> {
        let row = sqlx::query("SELECT * FROM images WHERE import_id = ?")
            .bind(import_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ImportError::database(format!("failed to query image record: {e}")))?;
        row.as_ref().map(Self::record_from_row).transpose()
    }

    async fn find_by_note_id(&self, note_id: &NoteId) -> Result<Vec<ImageRecord>, ImportError> {
        let rows = sqlx::query("SELECT * FROM images WHERE note_id = ? ORDER BY created_at")
            .bind(note_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ImportError::database(format!("failed to query image records: {e}")))?;
        rows.iter().map(Self::record_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::schema::{connect, ensure_schema};
    use recipe_import_domain::DerivativeKind;

    async fn repository() -> SqliteImageRepository {
        let pool = connect(":memory:").await.unwrap();
        ensure_schema(&pool).await.unwrap();
        SqliteImageRepository::new(pool)
    }

    fn record(import_id: &str) -> ImageRecord {
        let mut record = ImageRecord::pending(
            ImportId::new(import_id).unwrap(),
            Some(NoteId::new("n1").unwrap()),
        );
        record.set_url(DerivativeKind::Thumbnail, "/images/a-thumbnail.jpg");
        record.original_width = Some(1200);
        record.original_height = Some(800);
        record.original_size = Some(123_456);
        record.original_format = Some("jpeg".to_string());
        record
    }

    #[tokio::test]
    async fn test_upsert_assigns_stable_surrogate_id() {
        let repo = repository().await;
        let first = repo.upsert(&record("i1")).await.unwrap();

        let mut updated = record("i1");
        updated.processing_status = ProcessingStatus::Completed;
        let second = repo.upsert(&updated).await.unwrap();

        assert_eq!(first, second);

        let found = repo
            .find_by_import_id(&ImportId::new("i1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.processing_status, ProcessingStatus::Completed);
        assert_eq!(found.image_id, Some(first));
        assert_eq!(found.original_width, Some(1200));
    }

    #[tokio::test]
    async fn test_upsert_syncs_note_id_on_conflict() {
        let repo = repository().await;
        repo.upsert(&record("i1")).await.unwrap();

        let mut moved = record("i1");
        moved.note_id = Some(NoteId::new("n2").unwrap());
        repo.upsert(&moved).await.unwrap();

        let found = repo
            .find_by_import_id(&ImportId::new("i1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.note_id, Some(NoteId::new("n2").unwrap()));
    }

    #[tokio::test]
    async fn test_update_status_and_error_roundtrip() {
        let repo = repository().await;
        let image_id = repo.upsert(&record("i1")).await.unwrap();

        repo.update_status(&image_id, ProcessingStatus::Failed, Some("decode failed"))
            .await
            .unwrap();

        let found = repo
            .find_by_import_id(&ImportId::new("i1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.processing_status, ProcessingStatus::Failed);
        assert_eq!(found.processing_error.as_deref(), Some("decode failed"));
    }

    #[tokio::test]
    async fn test_update_status_for_missing_record_errors() {
        let repo = repository().await;
        let err = repo
            .update_status(&ImageId::new("ghost").unwrap(), ProcessingStatus::Completed, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_mark_failed_without_record_is_ok() {
        let repo = repository().await;
        repo.mark_failed(&ImportId::new("never-seen").unwrap(), "boom")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_find_by_note_id() {
        let repo = repository().await;
        repo.upsert(&record("i1")).await.unwrap();
        repo.upsert(&record("i2")).await.unwrap();
        let records = repo.find_by_note_id(&NoteId::new("n1").unwrap()).await.unwrap();
        assert_eq!(records.len(), 2);
    }
}
