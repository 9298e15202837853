// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Categorization Action
//!
//! Assigns a category to a persisted note from title keywords. Runs once
//! per note, after the ingredient fan-out has completed (or directly when
//! a note had no ingredient lines). Keyword classification stands in for
//! the upstream model-backed classifier; unknown notes land in
//! `uncategorized`.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use recipe_import_domain::jobs::CategorizationJobData;
use recipe_import_domain::{
    ActionContext, ActionName, EventContext, ImportError, ImportStatus, StatusEvent,
};

use crate::application::pipeline::{Action, ActionFactory, WorkerDeps};

/// Registers the categorization-queue actions into a worker's factory.
pub fn register_categorization_actions(
    factory: &ActionFactory<CategorizationJobData>,
) -> Result<(), ImportError> {
    factory.register(ActionName::CategorizeNote, Arc::new(|_| Arc::new(CategorizeNote)))?;
    Ok(())
}

const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("soups", &["soup", "broth", "stew", "chowder"]),
    ("salads", &["salad", "slaw"]),
    ("baking", &["cake", "cookie", "bread", "muffin", "pie", "tart", "bake"]),
    ("breakfast", &["pancake", "waffle", "omelet", "porridge", "granola"]),
    ("drinks", &["smoothie", "juice", "cocktail", "lemonade"]),
    ("mains", &["chicken", "beef", "pork", "fish", "pasta", "curry", "roast"]),
];

/// Title-keyword category, defaulting to `uncategorized`.
pub fn categorize_title(title: &str) -> &'static str {
    let lowered = title.to_lowercase();
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|k| lowered.contains(k)) {
            return category;
        }
    }
    "uncategorized"
}

pub struct CategorizeNote;

#[async_trait]
impl Action<CategorizationJobData> for CategorizeNote {
    fn name(&self) -> ActionName {
        ActionName::CategorizeNote
    }

    async fn execute(
        &self,
        data: CategorizationJobData,
        deps: &WorkerDeps,
        ctx: &ActionContext,
    ) -> Result<CategorizationJobData, ImportError> {
        let note = deps
            .notes
            .find_by_id(&data.note_id)
            .await?
            .ok_or_else(|| ImportError::NotFound(format!("note {}", data.note_id)))?;

        let category = categorize_title(&note.title);
        deps.notes.set_category(&data.note_id, category).await?;
        info!(
            job_id = %ctx.job_id(),
            note_id = %data.note_id,
            category,
            "note categorized"
        );

        if let Some(broadcaster) = deps.broadcaster() {
            let event = StatusEvent::new(
                data.import_id.clone(),
                Some(data.note_id.clone()),
                ImportStatus::Completed,
                EventContext::Categorization,
                format!("note categorized as {category}"),
            )
            .with_indent(1)
            .with_metadata("category", serde_json::json!(category));
            if let Err(e) = broadcaster.emit(event).await {
                warn!(job_id = %ctx.job_id(), error = %e, "failed to broadcast categorization event");
            }
        }

        Ok(data)
    }
}
