// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! This module provides the unified, hierarchical error system for the
//! recipe-import domain. It implements the error handling strategy shared by
//! every worker, pipeline, and action: failures are categorized, carry a
//! severity, and expose a retryability signal that the queue layer consults
//! when deciding between reschedule and terminal failure.
//!
//! ## Overview
//!
//! The error system is designed around Domain-Driven Design principles:
//!
//! - **Domain-Specific**: Errors are tailored to job processing domain
//!   concepts (queues, pipelines, actions, records)
//! - **Categorized**: Every error maps onto a closed [`ErrorCategory`]
//!   taxonomy used for classification and metrics
//! - **Severity-Aware**: Every error maps onto a closed [`ErrorSeverity`]
//!   scale used for log routing and retry gating
//! - **Type-Safe**: Rust's type system ensures comprehensive error handling
//!
//! ## Error Architecture
//!
//! ### Categories
//!
//! The closed category set mirrors the failure surfaces of the platform:
//!
//! - **Validation**: Missing or malformed input fields; never retried
//! - **Database**: Record persistence failures; retried per policy
//! - **Queue**: Queue-backend failures; retried per policy
//! - **Parsing**: Note/ingredient parse failures; never retried
//! - **ExternalService**: Object store and other remote collaborators
//! - **Network**: Connection-level failures; retried with backoff
//! - **Timeout**: Operations exceeding their budget; retried with backoff
//! - **Worker**: Framework invariant violations; terminal and loud
//! - **Unknown**: Anything unclassified; retried conservatively
//!
//! ### Severities
//!
//! - **Low**: Expected operational noise (validation, missing records)
//! - **Medium**: Transient infrastructure trouble
//! - **High**: Misconfiguration requiring operator attention
//! - **Critical**: Framework violations; jobs carrying these never retry
//!
//! ## Retry Semantics
//!
//! [`ImportError::is_retryable`] encodes the type-level half of the retry
//! policy: validation, parsing, configuration, and worker errors are terminal
//! regardless of attempt count; everything else is eligible and the error
//! handler applies attempt limits and backoff on top.

use thiserror::Error;

/// Closed classification taxonomy for import errors.
///
/// Categories drive keyword classification of foreign errors, metrics
/// labels, and the type-level retry decision. The set is closed: new failure
/// surfaces must map onto an existing category or extend this enum (and the
/// tests that pin its completeness).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Validation,
    Database,
    Queue,
    Parsing,
    ExternalService,
    Network,
    Timeout,
    Worker,
    Unknown,
}

impl ErrorCategory {
    /// Stable lowercase label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::Database => "database",
            ErrorCategory::Queue => "queue",
            ErrorCategory::Parsing => "parsing",
            ErrorCategory::ExternalService => "external_service",
            ErrorCategory::Network => "network",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Worker => "worker",
            ErrorCategory::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Closed severity scale for import errors.
///
/// Severity routes log output (error/warn/info) and participates in the
/// retry decision: `Critical` errors are never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Stable lowercase label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Low => "low",
            ErrorSeverity::Medium => "medium",
            ErrorSeverity::High => "high",
            ErrorSeverity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain-specific errors for the recipe-import processing platform.
///
/// This enum represents all failure modes that can occur within the domain
/// layer and the pipelines built on it. Each variant includes a descriptive
/// message; the [`JobFailed`](ImportError::JobFailed) variant additionally
/// carries the queue/job context added by the error-handling wrapper so a
/// failure surfaced to the queue identifies its origin.
///
/// ## Design Principles
///
/// - **Specific**: Each variant represents a specific failure mode
/// - **Actionable**: Messages provide enough context for debugging
/// - **Categorized**: Variants map onto [`ErrorCategory`] for systematic
///   handling
/// - **Recoverable**: Retryability is a property of the variant, not of the
///   call site
#[derive(Error, Debug, Clone)]
pub enum ImportError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Queue error: {0}")]
    QueueError(String),

    #[error("Parsing error: {0}")]
    ParsingError(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout error: {0}")]
    TimeoutError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Service unhealthy: {0}")]
    ServiceUnhealthy(String),

    #[error("Worker error: {0}")]
    WorkerError(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),

    /// A pipeline failure wrapped with its job and queue context.
    ///
    /// Produced by the error-handling wrapper around action execution; the
    /// category, severity, and retryability of the wrapper are those of the
    /// underlying error.
    #[error("{queue} job {job_id} failed in {action}: {source}")]
    JobFailed {
        queue: String,
        job_id: String,
        action: String,
        #[source]
        source: Box<ImportError>,
    },
}

impl ImportError {
    /// Creates a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Creates a validation error naming a missing required field
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    /// Creates a new configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Creates a new database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::DatabaseError(msg.into())
    }

    /// Creates a new queue-backend error
    pub fn queue(msg: impl Into<String>) -> Self {
        Self::QueueError(msg.into())
    }

    /// Creates a new parsing error
    pub fn parsing(msg: impl Into<String>) -> Self {
        Self::ParsingError(msg.into())
    }

    /// Creates a new external-service error
    pub fn external_service(msg: impl Into<String>) -> Self {
        Self::ExternalServiceError(msg.into())
    }

    /// Creates a new network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::NetworkError(msg.into())
    }

    /// Creates a new timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::TimeoutError(msg.into())
    }

    /// Creates a new IO error
    pub fn io(msg: impl Into<String>) -> Self {
        Self::IoError(msg.into())
    }

    /// Creates a new health-gate rejection (retryable by construction)
    pub fn service_unhealthy(msg: impl Into<String>) -> Self {
        Self::ServiceUnhealthy(msg.into())
    }

    /// Creates a new worker framework error
    pub fn worker(msg: impl Into<String>) -> Self {
        Self::WorkerError(msg.into())
    }

    /// Creates a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    /// Creates an unclassified error (retried conservatively)
    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }

    /// Creates a cancellation marker
    pub fn cancelled() -> Self {
        Self::Cancelled("operation cancelled".to_string())
    }

    /// Wraps an error with the job/queue context it failed under.
    ///
    /// Idempotent on already-wrapped errors: wrapping a `JobFailed` again
    /// replaces the outer context rather than nesting.
    pub fn with_job_context(
        self,
        queue: impl Into<String>,
        job_id: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        let source = match self {
            ImportError::JobFailed { source, .. } => source,
            other => Box::new(other),
        };
        ImportError::JobFailed {
            queue: queue.into(),
            job_id: job_id.into(),
            action: action.into(),
            source,
        }
    }

    /// The closed category this error classifies under.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ImportError::ValidationError(_)
            | ImportError::MissingField(_)
            | ImportError::InvalidConfiguration(_) => ErrorCategory::Validation,
            ImportError::DatabaseError(_) | ImportError::NotFound(_) => ErrorCategory::Database,
            ImportError::QueueError(_) => ErrorCategory::Queue,
            ImportError::ParsingError(_) => ErrorCategory::Parsing,
            ImportError::ExternalServiceError(_) => ErrorCategory::ExternalService,
            ImportError::NetworkError(_) => ErrorCategory::Network,
            ImportError::TimeoutError(_) => ErrorCategory::Timeout,
            ImportError::WorkerError(_) | ImportError::InternalError(_) => ErrorCategory::Worker,
            ImportError::ServiceUnhealthy(_) => ErrorCategory::Worker,
            ImportError::IoError(_) | ImportError::Cancelled(_) | ImportError::Unknown(_) => {
                ErrorCategory::Unknown
            }
            ImportError::JobFailed { source, .. } => source.category(),
        }
    }

    /// The severity this error logs and gates at.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ImportError::ValidationError(_)
            | ImportError::MissingField(_)
            | ImportError::NotFound(_)
            | ImportError::Cancelled(_) => ErrorSeverity::Low,
            ImportError::DatabaseError(_)
            | ImportError::QueueError(_)
            | ImportError::ParsingError(_)
            | ImportError::ExternalServiceError(_)
            | ImportError::NetworkError(_)
            | ImportError::TimeoutError(_)
            | ImportError::IoError(_)
            | ImportError::Unknown(_)
            | ImportError::ServiceUnhealthy(_) => ErrorSeverity::Medium,
            ImportError::InvalidConfiguration(_) => ErrorSeverity::High,
            ImportError::WorkerError(_) | ImportError::InternalError(_) => ErrorSeverity::Critical,
            ImportError::JobFailed { source, .. } => source.severity(),
        }
    }

    /// Whether this error is eligible for retry at the type level.
    ///
    /// The error handler applies attempt limits on top of this; a `true`
    /// here is necessary but not sufficient for a reschedule. Validation and
    /// parsing failures are deterministic and never retried; critical
    /// severities indicate a framework violation that retrying cannot fix.
    pub fn is_retryable(&self) -> bool {
        if self.severity() == ErrorSeverity::Critical {
            return false;
        }
        !matches!(
            self.category(),
            ErrorCategory::Validation | ErrorCategory::Parsing
        ) && !matches!(self, ImportError::Cancelled(_))
    }

    /// The innermost error message, without any job-context framing.
    pub fn root_message(&self) -> String {
        match self {
            ImportError::JobFailed { source, .. } => source.root_message(),
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(error: std::io::Error) -> Self {
        ImportError::IoError(error.to_string())
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(error: serde_json::Error) -> Self {
        ImportError::ParsingError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_terminal() {
        assert!(!ImportError::validation("missing note id").is_retryable());
        assert!(!ImportError::missing_field("import_id").is_retryable());
        assert!(!ImportError::invalid_config("bad port").is_retryable());
    }

    #[test]
    fn test_infrastructure_errors_are_retryable() {
        assert!(ImportError::database("locked").is_retryable());
        assert!(ImportError::queue("redis gone").is_retryable());
        assert!(ImportError::network("econnrefused").is_retryable());
        assert!(ImportError::timeout("upload timed out").is_retryable());
        assert!(ImportError::service_unhealthy("db probe failing").is_retryable());
    }

    #[test]
    fn test_critical_errors_never_retry() {
        assert_eq!(ImportError::worker("no pipeline").severity(), ErrorSeverity::Critical);
        assert!(!ImportError::worker("no pipeline").is_retryable());
        assert!(!ImportError::internal("poisoned state").is_retryable());
    }

    #[test]
    fn test_parsing_errors_are_terminal() {
        let err = ImportError::parsing("unclosed tag");
        assert_eq!(err.category(), ErrorCategory::Parsing);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_job_context_wrapping() {
        let err = ImportError::database("constraint violated")
            .with_job_context("image", "job-1", "save_image");
        assert_eq!(err.category(), ErrorCategory::Database);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.is_retryable());
        assert!(err.to_string().contains("image job job-1"));
        assert_eq!(err.root_message(), "Database error: constraint violated");
    }

    #[test]
    fn test_job_context_wrapping_is_idempotent() {
        let err = ImportError::timeout("slow store")
            .with_job_context("image", "job-1", "upload_processed")
            .with_job_context("image", "job-1", "upload_processed");
        match err {
            ImportError::JobFailed { source, .. } => {
                assert!(matches!(*source, ImportError::TimeoutError(_)));
            }
            other => panic!("expected JobFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: ImportError = io.into();
        assert_eq!(err.category(), ErrorCategory::Unknown);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_category_labels_are_stable() {
        assert_eq!(ErrorCategory::ExternalService.as_str(), "external_service");
        assert_eq!(ErrorSeverity::Critical.as_str(), "critical");
    }
}
