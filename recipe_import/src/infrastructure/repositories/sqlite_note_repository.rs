// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # SQLite Note Repository
//!
//! Persistence for notes and their refined lines. Notes upsert on
//! `import_id` (re-delivered note jobs converge on one row); ingredient and
//! instruction lines upsert on `(note_id, line_index)` so downstream
//! retries overwrite rather than duplicate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use recipe_import_domain::entities::{IngredientLine, InstructionLine, NoteRecord};
use recipe_import_domain::repositories::NoteRepository;
use recipe_import_domain::value_objects::{ImportId, NoteId};
use recipe_import_domain::ImportError;

pub struct SqliteNoteRepository {
    pool: SqlitePool,
}

impl SqliteNoteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn note_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<NoteRecord, ImportError> {
        Ok(NoteRecord {
            note_id: NoteId::new(row.get::<String, _>("note_id"))
                .map_err(|e| ImportError::database(format!("corrupt note_id column: {e}")))?,
            import_id: ImportId::new(row.get::<String, _>("import_id"))
                .map_err(|e| ImportError::database(format!("corrupt import_id column: {e}")))?,
            title: row.get("title"),
            source_url: row.get("source_url"),
            html: row.get("html"),
            category: row.get("category"),
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
        })
    }
}

#[async_trait]
impl NoteRepository for SqliteNoteRepository {
    async fn save(&self, note: &NoteRecord) -> Result<NoteId, ImportError> {
        let row = sqlx::query(
            r#"
            INSERT INTO notes (note_id, import_id, title, source_url, html, category, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(import_id) DO UPDATE SET
                title      = excluded.title,
                source_url = excluded.source_url,
                html       = excluded.html
            RETURNING note_id
            "#,
        )
        .bind(note.note_id.as_str())
        .bind(note.import_id.as_str())
        .bind(&note.title)
        .bind(&note.source_url)
        .bind(&note.html)
        .bind(&note.category)
        .bind(note.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ImportError::database(format!("failed to save note: {e}")))?;

        let note_id = NoteId::new(row.get::<String, _>("note_id"))
            .map_err(|e| ImportError::database(format!("corrupt note_id column: {e}")))?;
        debug!(note_id = %note_id, import_id = %note.import_id, "note saved");
        Ok(note_id)
    }

    async fn find_by_id(&self, note_id: &NoteId) -> Result<Option<NoteRecord>, ImportError> {
        let row = sqlx::query("SELECT * FROM notes WHERE note_id = ?")
            .bind(note_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ImportError::database(format!("failed to query note: {e}")))?;
        row.as_ref().map(Self::note_from_row).transpose()
    }

    async fn find_by_import_id(
        &self,
        import_id: &ImportId,
    ) -> Result<Option<NoteRecord>, ImportError> {
        let row = sqlx::query("SELECT * FROM notes WHERE import_id = ?")
            .bind(import_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ImportError::database(format!("failed to query note: {e}")))?;
        row.as_ref().map(Self::note_from_row).transpose()
    }

    async fn save_ingredient(&self, line: &IngredientLine) -> Result<(), ImportError> {
        sqlx::query(
            r#"
            INSERT INTO note_ingredients
                (note_id, line_index, raw, parsed_name, parsed_quantity, parsed_unit)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(note_id, line_index) DO UPDATE SET
                raw             = excluded.raw,
                parsed_name     = excluded.parsed_name,
                parsed_quantity = excluded.parsed_quantity,
                parsed_unit     = excluded.parsed_unit
            "#,
        )
        .bind(line.note_id.as_str())
        .bind(line.index as i64)
        .bind(&line.raw)
        .bind(&line.parsed_name)
        .bind(&line.parsed_quantity)
        .bind(&line.parsed_unit)
        .execute(&self.pool)
        .await
        .map_err(|e| ImportError::database(format!("failed to save ingredient line: {e}")))?;
        Ok(())
    }

    async fn save_instruction(&self, line: &InstructionLine) -> Result<(), ImportError> {
        sqlx::query(
            r#"
            INSERT INTO note_instructions (note_id, line_index, text)
            VALUES (?, ?, ?)
            ON CONFLICT(note_id, line_index) DO UPDATE SET text = excluded.text
            "#,
        )
        .bind(line.note_id.as_str())
        .bind(line.index as i64)
        .bind(&line.text)
        .execute(&self.pool)
        .await
        .map_err(|e| ImportError::database(format!("failed to save instruction line: {e}")))?;
        Ok(())
    }

    async fn set_category(&self, note_id: &NoteId, category: &str) -> Result<(), ImportError> {
        let result = sqlx::query("UPDATE notes SET category = ? WHERE note_id = ?")
            .bind(category)
            .bind(note_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| ImportError::database(format!("failed to set category: {e}")))?;
        if result.rows_affected() == 0 {
            return Err(ImportError::NotFound(format!("note {note_id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::schema::{connect, ensure_schema};

    async fn repository() -> SqliteNoteRepository {
        let pool = connect(":memory:").await.unwrap();
        ensure_schema(&pool).await.unwrap();
        SqliteNoteRepository::new(pool)
    }

    fn note(import_id: &str) -> NoteRecord {
        NoteRecord::new(
            NoteId::generate(),
            ImportId::new(import_id).unwrap(),
            "Pea Soup",
            "<html><h1>Pea Soup</h1></html>",
            None,
        )
    }

    #[tokio::test]
    async fn test_save_and_find_roundtrip() {
        let repo = repository().await;
        let record = note("i1");
        let note_id = repo.save(&record).await.unwrap();
        assert_eq!(note_id, record.note_id);

        let found = repo.find_by_id(&note_id).await.unwrap().unwrap();
        assert_eq!(found.title, "Pea Soup");
        assert!(found.category.is_none());
    }

    #[tokio::test]
    async fn test_save_upserts_on_import_id() {
        let repo = repository().await;
        let first = note("i1");
        let first_id = repo.save(&first).await.unwrap();

        let mut second = note("i1");
        second.title = "Split Pea Soup".to_string();
        let second_id = repo.save(&second).await.unwrap();

        // The original surrogate id survives the upsert.
        assert_eq!(first_id, second_id);
        let found = repo.find_by_import_id(&ImportId::new("i1").unwrap()).await.unwrap().unwrap();
        assert_eq!(found.title, "Split Pea Soup");
    }

    #[tokio::test]
    async fn test_ingredient_lines_upsert_by_index() {
        let repo = repository().await;
        let record = note("i1");
        let note_id = repo.save(&record).await.unwrap();

        let mut line = IngredientLine::raw_line(note_id.clone(), 0, "2 cups peas");
        repo.save_ingredient(&line).await.unwrap();

        line.parsed_name = Some("peas".to_string());
        line.parsed_quantity = Some("2".to_string());
        line.parsed_unit = Some("cups".to_string());
        repo.save_ingredient(&line).await.unwrap();
    }

    #[tokio::test]
    async fn test_set_category() {
        let repo = repository().await;
        let record = note("i1");
        let note_id = repo.save(&record).await.unwrap();
        repo.set_category(&note_id, "soups").await.unwrap();
        let found = repo.find_by_id(&note_id).await.unwrap().unwrap();
        assert_eq!(found.category.as_deref(), Some("soups"));
    }

    #[tokio::test]
    async fn test_set_category_for_missing_note_errors() {
        let repo = repository().await;
        assert!(repo
            .set_category(&NoteId::new("ghost").unwrap(), "soups")
            .await
            .is_err());
    }
}
