// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Action Names
//!
//! The closed enumeration of pipeline action names, grouped by the queue
//! whose pipeline they belong to. Names are stable literals referenced by
//! factories, log lines, and tests; they are never scattered as ad-hoc
//! strings through the codebase.
//!
//! ## Membership
//!
//! - **notes**: `save_note`, `fan_out_note`
//! - **ingredients**: `parse_ingredient`, `ingredient_completed_status`
//! - **instruction**: `format_instruction`, `instruction_completed_status`
//! - **image**: `process_image`, `upload_original`, `upload_processed`,
//!   `save_image`, `cleanup_local_files`, `image_completed_status`,
//!   `check_image_completion`, plus the failure-path `image_failed_status`
//! - **categorization**: `categorize_note`
//! - **source**: `process_source`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::value_objects::QueueName;
use crate::ImportError;

/// The closed set of action names across all queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionName {
    // notes queue
    SaveNote,
    FanOutNote,
    // ingredients queue
    ParseIngredient,
    IngredientCompletedStatus,
    // instruction queue
    FormatInstruction,
    InstructionCompletedStatus,
    // image queue
    ProcessImage,
    UploadOriginal,
    UploadProcessed,
    SaveImage,
    CleanupLocalFiles,
    ImageCompletedStatus,
    CheckImageCompletion,
    ImageFailedStatus,
    // categorization queue
    CategorizeNote,
    // source queue
    ProcessSource,
}

impl ActionName {
    /// Wire-stable action name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionName::SaveNote => "save_note",
            ActionName::FanOutNote => "fan_out_note",
            ActionName::ParseIngredient => "parse_ingredient",
            ActionName::IngredientCompletedStatus => "ingredient_completed_status",
            ActionName::FormatInstruction => "format_instruction",
            ActionName::InstructionCompletedStatus => "instruction_completed_status",
            ActionName::ProcessImage => "process_image",
            ActionName::UploadOriginal => "upload_original",
            ActionName::UploadProcessed => "upload_processed",
            ActionName::SaveImage => "save_image",
            ActionName::CleanupLocalFiles => "cleanup_local_files",
            ActionName::ImageCompletedStatus => "image_completed_status",
            ActionName::CheckImageCompletion => "check_image_completion",
            ActionName::ImageFailedStatus => "image_failed_status",
            ActionName::CategorizeNote => "categorize_note",
            ActionName::ProcessSource => "process_source",
        }
    }

    /// The queue whose pipeline this action belongs to.
    pub fn queue(&self) -> QueueName {
        match self {
            ActionName::SaveNote | ActionName::FanOutNote => QueueName::Notes,
            ActionName::ParseIngredient | ActionName::IngredientCompletedStatus => {
                QueueName::Ingredients
            }
            ActionName::FormatInstruction | ActionName::InstructionCompletedStatus => {
                QueueName::Instruction
            }
            ActionName::ProcessImage
            | ActionName::UploadOriginal
            | ActionName::UploadProcessed
            | ActionName::SaveImage
            | ActionName::CleanupLocalFiles
            | ActionName::ImageCompletedStatus
            | ActionName::CheckImageCompletion
            | ActionName::ImageFailedStatus => QueueName::Image,
            ActionName::CategorizeNote => QueueName::Categorization,
            ActionName::ProcessSource => QueueName::Source,
        }
    }

    /// The image-queue pipeline sequence, in execution order.
    pub const IMAGE_PIPELINE: [ActionName; 7] = [
        ActionName::UploadOriginal,
        ActionName::ProcessImage,
        ActionName::UploadProcessed,
        ActionName::SaveImage,
        ActionName::CleanupLocalFiles,
        ActionName::ImageCompletedStatus,
        ActionName::CheckImageCompletion,
    ];
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActionName {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "save_note" => Ok(ActionName::SaveNote),
            "fan_out_note" => Ok(ActionName::FanOutNote),
            "parse_ingredient" => Ok(ActionName::ParseIngredient),
            "ingredient_completed_status" => Ok(ActionName::IngredientCompletedStatus),
            "format_instruction" => Ok(ActionName::FormatInstruction),
            "instruction_completed_status" => Ok(ActionName::InstructionCompletedStatus),
            "process_image" => Ok(ActionName::ProcessImage),
            "upload_original" => Ok(ActionName::UploadOriginal),
            "upload_processed" => Ok(ActionName::UploadProcessed),
            "save_image" => Ok(ActionName::SaveImage),
            "cleanup_local_files" => Ok(ActionName::CleanupLocalFiles),
            "image_completed_status" => Ok(ActionName::ImageCompletedStatus),
            "check_image_completion" => Ok(ActionName::CheckImageCompletion),
            "image_failed_status" => Ok(ActionName::ImageFailedStatus),
            "categorize_note" => Ok(ActionName::CategorizeNote),
            "process_source" => Ok(ActionName::ProcessSource),
            other => Err(ImportError::validation(format!("unknown action name: {other:?}"))),
        }
    }
}
