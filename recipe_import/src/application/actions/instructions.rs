// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Instruction Pipeline Actions
//!
//! One job per raw instruction line: normalize the text (whitespace,
//! leading capital, terminal punctuation), persist it, report completion.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use recipe_import_domain::entities::InstructionLine;
use recipe_import_domain::jobs::InstructionJobData;
use recipe_import_domain::{
    ActionContext, ActionName, EventContext, ImportError, ImportStatus, StatusEvent,
};

use crate::application::pipeline::{require_fields, Action, ActionFactory, WorkerDeps};
use crate::application::services::completion_tracker::CompletionCategory;

/// Registers the instruction-queue actions into a worker's factory.
pub fn register_instruction_actions(
    factory: &ActionFactory<InstructionJobData>,
) -> Result<(), ImportError> {
    factory.register(ActionName::FormatInstruction, Arc::new(|_| Arc::new(FormatInstruction)))?;
    factory.register(
        ActionName::InstructionCompletedStatus,
        Arc::new(|_| Arc::new(InstructionCompletedStatus)),
    )?;
    Ok(())
}

/// Whitespace-collapsed, capitalized, terminally punctuated form of a
/// raw instruction line.
pub fn format_instruction_text(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return collapsed;
    }
    let mut chars = collapsed.chars();
    let mut text: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => collapsed,
    };
    if !text.ends_with(['.', '!', '?']) {
        text.push('.');
    }
    text
}

/// Normalizes one instruction line and persists it.
pub struct FormatInstruction;

#[async_trait]
impl Action<InstructionJobData> for FormatInstruction {
    fn name(&self) -> ActionName {
        ActionName::FormatInstruction
    }

    fn validate_input(&self, data: &InstructionJobData) -> Result<(), ImportError> {
        require_fields(&[("text", Some(&data.text))])
    }

    async fn execute(
        &self,
        mut data: InstructionJobData,
        deps: &WorkerDeps,
        _ctx: &ActionContext,
    ) -> Result<InstructionJobData, ImportError> {
        let formatted = format_instruction_text(&data.text);
        let line = InstructionLine::new(data.note_id.clone(), data.line_index, formatted.clone());
        deps.notes.save_instruction(&line).await?;
        data.text = formatted;
        Ok(data)
    }
}

/// Broadcasts line completion and reports it to the tracker.
pub struct InstructionCompletedStatus;

#[async_trait]
impl Action<InstructionJobData> for InstructionCompletedStatus {
    fn name(&self) -> ActionName {
        ActionName::InstructionCompletedStatus
    }

    async fn execute(
        &self,
        data: InstructionJobData,
        deps: &WorkerDeps,
        ctx: &ActionContext,
    ) -> Result<InstructionJobData, ImportError> {
        if let Some(broadcaster) = deps.broadcaster() {
            let event = StatusEvent::new(
                data.import_id.clone(),
                Some(data.note_id.clone()),
                ImportStatus::Processing,
                EventContext::InstructionProcessing,
                format!("instruction line {} formatted", data.line_index),
            )
            .with_indent(2);
            if let Err(e) = broadcaster.emit(event).await {
                warn!(job_id = %ctx.job_id(), error = %e, "failed to broadcast instruction event");
            }
        }

        deps.completion
            .mark_complete(&data.note_id, CompletionCategory::Instruction, ctx.job_id())
            .await;
        Ok(data)
    }
}
