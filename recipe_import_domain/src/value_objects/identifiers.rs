// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Identifier Value Objects
//!
//! Type-safe identifier newtypes for the import domain.
//!
//! ## Overview
//!
//! Four identities flow through the platform and must never be confused:
//!
//! - [`NoteId`] - the persisted note a fan-out belongs to
//! - [`ImportId`] - the logical import operation; natural upsert key of the
//!   image record
//! - [`JobId`] - one queue job; also the idempotency key for completion
//!   deduplication
//! - [`ImageId`] - surrogate key assigned by the database when an image
//!   record is first persisted
//!
//! All four serialize as plain strings for queue payloads and database
//! columns. Identity fields, once set on a job payload, never change across
//! a pipeline run.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::ImportError;

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from a non-empty string.
            pub fn new(value: impl Into<String>) -> Result<Self, ImportError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(ImportError::validation(concat!(
                        stringify!($name),
                        " must not be empty"
                    )));
                }
                Ok(Self(value))
            }

            /// Generates a fresh random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// The underlying string value.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the identifier, returning the inner string.
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Identifier of a persisted note.
    NoteId
}

string_id! {
    /// Identifier of a logical import operation.
    ///
    /// The import id is the natural unique key of the image record: the
    /// persistence step upserts on it, which is what makes re-delivered
    /// image jobs idempotent at the database layer.
    ImportId
}

string_id! {
    /// Surrogate identifier of a persisted image record.
    ///
    /// Assigned exactly once, by the persistence step; stable afterwards.
    ImageId
}

/// Identifier of a single queue job.
///
/// Job ids are minted by the queue on push and double as the idempotency
/// key for completion tracking: duplicate `mark_complete` calls carrying
/// the same job id never double-decrement a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Mints a fresh job identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Reconstructs a job id from its canonical string form.
    pub fn parse(value: &str) -> Result<Self, ImportError> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|e| ImportError::validation(format!("invalid job id {value:?}: {e}")))
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_id_rejects_empty() {
        assert!(NoteId::new("").is_err());
        assert!(NoteId::new("   ").is_err());
        assert!(NoteId::new("n1").is_ok());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(ImportId::generate(), ImportId::generate());
        assert_ne!(JobId::generate(), JobId::generate());
    }

    #[test]
    fn test_job_id_roundtrip() {
        let id = JobId::generate();
        let parsed = JobId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_job_id_parse_rejects_garbage() {
        assert!(JobId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let id = NoteId::new("n1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"n1\"");
    }
}
