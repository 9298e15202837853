// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Queue Names
//!
//! The closed set of queues the platform runs. One worker is constructed per
//! queue; cross-queue edges exist only at the notes fan-out. The string forms
//! are wire-stable: they appear in queue payloads, log lines, metrics labels,
//! and configuration sections, and must never drift.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ImportError;

/// The closed set of job queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueName {
    Notes,
    Ingredients,
    Instruction,
    Image,
    Categorization,
    Source,
}

impl QueueName {
    /// All queues, in worker start order.
    ///
    /// The notes worker starts first so fan-out targets are already
    /// consuming by the time the first note job completes.
    pub const ALL: [QueueName; 6] = [
        QueueName::Notes,
        QueueName::Ingredients,
        QueueName::Instruction,
        QueueName::Image,
        QueueName::Categorization,
        QueueName::Source,
    ];

    /// Wire-stable queue name.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueName::Notes => "notes",
            QueueName::Ingredients => "ingredients",
            QueueName::Instruction => "instruction",
            QueueName::Image => "image",
            QueueName::Categorization => "categorization",
            QueueName::Source => "source",
        }
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QueueName {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "notes" => Ok(QueueName::Notes),
            "ingredients" => Ok(QueueName::Ingredients),
            "instruction" => Ok(QueueName::Instruction),
            "image" => Ok(QueueName::Image),
            "categorization" => Ok(QueueName::Categorization),
            "source" => Ok(QueueName::Source),
            other => Err(ImportError::validation(format!("unknown queue name: {other:?}"))),
        }
    }
}
