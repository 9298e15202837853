// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Ingredients Pipeline Actions
//!
//! One job per raw ingredient line: split it into quantity, unit, and
//! name, persist the refined line, then report completion. The line
//! parser is a deliberately simple leading-quantity heuristic - lines it
//! cannot split are stored with the raw text only, never failed.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, warn};

use recipe_import_domain::entities::IngredientLine;
use recipe_import_domain::jobs::IngredientJobData;
use recipe_import_domain::{
    ActionContext, ActionName, EventContext, ImportError, ImportStatus, StatusEvent,
};

use crate::application::pipeline::{require_fields, Action, ActionFactory, WorkerDeps};
use crate::application::services::completion_tracker::CompletionCategory;

/// Registers the ingredients-queue actions into a worker's factory.
pub fn register_ingredient_actions(
    factory: &ActionFactory<IngredientJobData>,
) -> Result<(), ImportError> {
    factory.register(ActionName::ParseIngredient, Arc::new(|_| Arc::new(ParseIngredient)))?;
    factory.register(
        ActionName::IngredientCompletedStatus,
        Arc::new(|_| Arc::new(IngredientCompletedStatus)),
    )?;
    Ok(())
}

static LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        ^\s*
        (?P<quantity>\d+(?:[./]\d+)?(?:\s+\d+/\d+)?|[½⅓¼¾⅔⅛])?
        \s*
        (?P<unit>cups?|tablespoons?|tbsp|teaspoons?|tsp|grams?|g|kilograms?|kg|
                 milliliters?|ml|liters?|l|ounces?|oz|pounds?|lbs?|cloves?|
                 bunch(?:es)?|pinch(?:es)?|cans?|slices?)?
        \b\s*
        (?:of\s+)?
        (?P<name>.+?)
        \s*$",
    )
    .expect("static regex")
});

/// Splits a raw line into `(quantity, unit, name)`; any part may be
/// absent.
pub fn parse_ingredient_line(raw: &str) -> (Option<String>, Option<String>, Option<String>) {
    let Some(captures) = LINE.captures(raw) else {
        return (None, None, None);
    };
    let quantity = captures.name("quantity").map(|m| m.as_str().to_string());
    let unit = captures.name("unit").map(|m| m.as_str().to_lowercase());
    let name = captures
        .name("name")
        .map(|m| m.as_str().trim().to_string())
        .filter(|n| !n.is_empty());
    (quantity, unit, name)
}

/// Parses one raw ingredient line and persists the refined record.
pub struct ParseIngredient;

#[async_trait]
impl Action<IngredientJobData> for ParseIngredient {
    fn name(&self) -> ActionName {
        ActionName::ParseIngredient
    }

    fn validate_input(&self, data: &IngredientJobData) -> Result<(), ImportError> {
        require_fields(&[("raw", Some(&data.raw))])
    }

    async fn execute(
        &self,
        data: IngredientJobData,
        deps: &WorkerDeps,
        ctx: &ActionContext,
    ) -> Result<IngredientJobData, ImportError> {
        let (quantity, unit, name) = parse_ingredient_line(&data.raw);
        debug!(
            job_id = %ctx.job_id(),
            note_id = %data.note_id,
            line = data.line_index,
            quantity = quantity.as_deref().unwrap_or(""),
            unit = unit.as_deref().unwrap_or(""),
            "ingredient line parsed"
        );

        let mut line = IngredientLine::raw_line(data.note_id.clone(), data.line_index, &data.raw);
        line.parsed_quantity = quantity;
        line.parsed_unit = unit;
        line.parsed_name = name;
        deps.notes.save_ingredient(&line).await?;
        Ok(data)
    }
}

/// Broadcasts line completion and reports it to the tracker.
pub struct IngredientCompletedStatus;

#[async_trait]
impl Action<IngredientJobData> for IngredientCompletedStatus {
    fn name(&self) -> ActionName {
        ActionName::IngredientCompletedStatus
    }

    async fn execute(
        &self,
        data: IngredientJobData,
        deps: &WorkerDeps,
        ctx: &ActionContext,
    ) -> Result<IngredientJobData, ImportError> {
        if let Some(broadcaster) = deps.broadcaster() {
            let event = StatusEvent::new(
                data.import_id.clone(),
                Some(data.note_id.clone()),
                ImportStatus::Processing,
                EventContext::IngredientProcessing,
                format!("ingredient line {} processed", data.line_index),
            )
            .with_indent(2);
            if let Err(e) = broadcaster.emit(event).await {
                warn!(job_id = %ctx.job_id(), error = %e, "failed to broadcast ingredient event");
            }
        }

        deps.completion
            .mark_complete(&data.note_id, CompletionCategory::Ingredient, ctx.job_id())
            .await;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity_unit_name() {
        let (q, u, n) = parse_ingredient_line("2 cups peas");
        assert_eq!(q.as_deref(), Some("2"));
        assert_eq!(u.as_deref(), Some("cups"));
        assert_eq!(n.as_deref(), Some("peas"));
    }

    #[test]
    fn test_parse_fraction_and_of() {
        let (q, u, n) = parse_ingredient_line("1/2 cup of chicken stock");
        assert_eq!(q.as_deref(), Some("1/2"));
        assert_eq!(u.as_deref(), Some("cup"));
        assert_eq!(n.as_deref(), Some("chicken stock"));
    }

    #[test]
    fn test_parse_unitless_line() {
        let (q, u, n) = parse_ingredient_line("3 eggs");
        assert_eq!(q.as_deref(), Some("3"));
        assert_eq!(u, None);
        assert_eq!(n.as_deref(), Some("eggs"));
    }

    #[test]
    fn test_parse_bare_name() {
        let (q, u, n) = parse_ingredient_line("salt to taste");
        assert_eq!(q, None);
        assert_eq!(u, None);
        assert_eq!(n.as_deref(), Some("salt to taste"));
    }

    #[test]
    fn test_parse_unicode_fraction() {
        let (q, _, n) = parse_ingredient_line("½ bunch mint");
        assert_eq!(q.as_deref(), Some("½"));
        assert_eq!(n.as_deref(), Some("mint"));
    }

    #[tokio::test]
    async fn test_parse_action_persists_refined_line() {
        use crate::application::test_support::test_deps;
        use recipe_import_domain::{ImportId, JobId, NoteId, QueueName};

        let deps = test_deps().await;
        let data = IngredientJobData {
            note_id: NoteId::new("n1").unwrap(),
            import_id: ImportId::new("i1").unwrap(),
            line_index: 0,
            raw: "2 cups peas".to_string(),
        };
        let ctx = ActionContext::new(
            JobId::generate(),
            0,
            QueueName::Ingredients,
            "ingredient_processing",
            "ingredients-worker",
        );

        let out = ParseIngredient.execute(data, &deps, &ctx).await.unwrap();
        assert_eq!(out.raw, "2 cups peas");

        // Completed-status marks the tracker; with one registered job the
        // note's ingredient category drains.
        deps.completion.register(
            &out.note_id,
            &out.import_id,
            CompletionCategory::Ingredient,
            1,
        );
        IngredientCompletedStatus.execute(out.clone(), &deps, &ctx).await.unwrap();
        assert!(deps.completion.is_complete(&out.note_id));
    }
}
