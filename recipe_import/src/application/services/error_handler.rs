// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Error Handler
//!
//! The single policy point for failure handling across all workers:
//! classification of foreign errors into the closed category set, the
//! retry decision, backoff arithmetic, severity-routed logging, and the
//! execution wrapper the pipeline runtime runs every action inside.
//!
//! ## Retry Policy
//!
//! `should_retry(err, attempt)` is false when any of these hold:
//!
//! - the attempt count has reached the configured maximum
//! - the error's category is `VALIDATION` (deterministic failures)
//! - the error's severity is `CRITICAL` (framework violations)
//!
//! and true otherwise. Backoff is delegated to the domain
//! [`RetryPolicy`]: `min(base × 2^attempt, max)`.
//!
//! ## Classification
//!
//! Foreign error strings are classified by keyword, checked in order:
//! database (`prisma`/`database`/`sql`), queue backend (`redis`), network
//! (`econnrefused`/`network`), timeout (`timed out`/`timeout`), external
//! service (`api`/`service`/`http`), otherwise unknown. Matching is
//! case-insensitive on the whole message.

use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

use recipe_import_domain::{
    ActionContext, ActionName, ErrorSeverity, ImportError, RetryPolicy,
};

/// Process-wide failure policy.
pub struct ErrorHandler {
    policy: RetryPolicy,
}

impl ErrorHandler {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Classifies a foreign error message into the closed category set.
    pub fn classify(&self, raw: &str) -> ImportError {
        let lowered = raw.to_lowercase();
        if ["prisma", "database", "sql"].iter().any(|k| lowered.contains(k)) {
            ImportError::database(raw)
        } else if lowered.contains("redis") {
            ImportError::queue(raw)
        } else if ["econnrefused", "network"].iter().any(|k| lowered.contains(k)) {
            ImportError::network(raw)
        } else if lowered.contains("timed out") || lowered.contains("timeout") {
            ImportError::timeout(raw)
        } else if ["api", "service", "http"].iter().any(|k| lowered.contains(k)) {
            ImportError::external_service(raw)
        } else {
            ImportError::unknown(raw)
        }
    }

    /// Whether a failed attempt should be rescheduled.
    pub fn should_retry(&self, err: &ImportError, attempt: u32) -> bool {
        if self.policy.attempts_exhausted(attempt) {
            return false;
        }
        err.is_retryable()
    }

    /// Delay before the next attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.policy.backoff_for(attempt)
    }

    /// Logs an error with its job context, routed by severity.
    ///
    /// `CRITICAL`/`HIGH` log at error, `MEDIUM` at warn, `LOW` at info.
    /// The merged context serializes as structured fields so log volume can
    /// be throttled by level without losing the invocation trail.
    pub fn log(&self, err: &ImportError, ctx: &ActionContext, action: ActionName) {
        let category = err.category().as_str();
        let severity = err.severity();
        match severity {
            ErrorSeverity::Critical | ErrorSeverity::High => error!(
                job_id = %ctx.job_id(),
                queue = %ctx.queue(),
                action = %action,
                attempt = ctx.attempt(),
                category,
                severity = %severity,
                error = %err,
                "action failed"
            ),
            ErrorSeverity::Medium => warn!(
                job_id = %ctx.job_id(),
                queue = %ctx.queue(),
                action = %action,
                attempt = ctx.attempt(),
                category,
                severity = %severity,
                error = %err,
                "action failed"
            ),
            ErrorSeverity::Low => info!(
                job_id = %ctx.job_id(),
                queue = %ctx.queue(),
                action = %action,
                attempt = ctx.attempt(),
                category,
                severity = %severity,
                error = %err,
                "action failed"
            ),
        }
    }

    /// Runs an operation; on failure, classifies, logs, and re-raises the
    /// error wrapped with the job/queue context it failed under.
    ///
    /// Typed errors keep their type; only `Unknown` errors (foreign
    /// failures an adapter could not place) go through keyword
    /// classification for a sharper category.
    pub async fn with_error_handling<T, F>(
        &self,
        op: F,
        ctx: &ActionContext,
        action: ActionName,
    ) -> Result<T, ImportError>
    where
        F: Future<Output = Result<T, ImportError>>,
    {
        match op.await {
            Ok(value) => Ok(value),
            Err(err) => {
                let err = match err {
                    ImportError::Unknown(message) => self.classify(&message),
                    other => other,
                };
                self.log(&err, ctx, action);
                Err(err.with_job_context(
                    ctx.queue().as_str(),
                    ctx.job_id().to_string(),
                    action.as_str(),
                ))
            }
        }
    }

    /// Structural validation of a JSON payload: returns a `VALIDATION`
    /// error naming the first required field that is absent, null, or an
    /// empty string.
    pub fn validate(data: &serde_json::Value, required_fields: &[&str]) -> Result<(), ImportError> {
        for field in required_fields {
            let missing = match data.get(field) {
                None | Some(serde_json::Value::Null) => true,
                Some(serde_json::Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            };
            if missing {
                return Err(ImportError::missing_field(*field));
            }
        }
        Ok(())
    }
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipe_import_domain::{ErrorCategory, JobId, QueueName};

    fn handler() -> ErrorHandler {
        ErrorHandler::new(RetryPolicy::new(3, 1_000, 30_000))
    }

    fn ctx() -> ActionContext {
        ActionContext::new(JobId::generate(), 1, QueueName::Image, "image_processing", "w1")
    }

    #[test]
    fn test_classify_database_keywords() {
        for msg in [
            "PrismaClientKnownRequestError: P2002",
            "database is locked",
            "SQL syntax error near SELECT",
        ] {
            assert_eq!(handler().classify(msg).category(), ErrorCategory::Database);
        }
    }

    #[test]
    fn test_classify_queue_backend() {
        assert_eq!(
            handler().classify("Redis connection lost").category(),
            ErrorCategory::Queue
        );
    }

    #[test]
    fn test_classify_network_and_timeout() {
        assert_eq!(
            handler().classify("connect ECONNREFUSED 127.0.0.1:6379").category(),
            ErrorCategory::Network
        );
        assert_eq!(
            handler().classify("operation timed out after 30s").category(),
            ErrorCategory::Timeout
        );
        assert_eq!(
            handler().classify("upload timeout").category(),
            ErrorCategory::Timeout
        );
    }

    #[test]
    fn test_classify_external_service() {
        assert_eq!(
            handler().classify("upstream API returned 503").category(),
            ErrorCategory::ExternalService
        );
    }

    #[test]
    fn test_classify_unknown_falls_through() {
        assert_eq!(
            handler().classify("something odd happened").category(),
            ErrorCategory::Unknown
        );
    }

    #[test]
    fn test_should_retry_respects_attempt_budget() {
        let h = handler();
        let err = ImportError::database("locked");
        assert!(h.should_retry(&err, 0));
        assert!(h.should_retry(&err, 2));
        assert!(!h.should_retry(&err, 3));
        assert!(!h.should_retry(&err, 7));
    }

    #[test]
    fn test_should_retry_rejects_validation_and_critical() {
        let h = handler();
        assert!(!h.should_retry(&ImportError::validation("missing"), 0));
        assert!(!h.should_retry(&ImportError::worker("invariant broken"), 0));
    }

    #[test]
    fn test_unknown_errors_retry_conservatively() {
        let h = handler();
        let err = h.classify("mystery failure");
        assert!(h.should_retry(&err, 0));
        assert!(!h.should_retry(&err, 3));
    }

    #[test]
    fn test_backoff_is_exponential_and_capped() {
        let h = handler();
        assert_eq!(h.backoff(0), Duration::from_millis(1_000));
        assert_eq!(h.backoff(1), Duration::from_millis(2_000));
        assert_eq!(h.backoff(10), Duration::from_millis(30_000));
    }

    #[test]
    fn test_validate_names_first_missing_field() {
        let data = serde_json::json!({
            "import_id": "i1",
            "filename": "",
            "output_dir": null,
        });
        let err = ErrorHandler::validate(&data, &["import_id", "filename", "output_dir"]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(err.to_string().contains("filename"));
    }

    #[tokio::test]
    async fn test_with_error_handling_wraps_context() {
        let h = handler();
        let result: Result<(), _> = h
            .with_error_handling(
                async { Err(ImportError::database("constraint")) },
                &ctx(),
                ActionName::SaveImage,
            )
            .await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("save_image"));
        assert_eq!(err.category(), ErrorCategory::Database);
    }

    #[tokio::test]
    async fn test_with_error_handling_passes_success_through() {
        let h = handler();
        let value = h
            .with_error_handling(async { Ok(41 + 1) }, &ctx(), ActionName::SaveImage)
            .await
            .unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_with_error_handling_sharpens_unknown_errors() {
        let h = handler();
        let result: Result<(), _> = h
            .with_error_handling(
                async { Err(ImportError::unknown("connect ECONNREFUSED 10.0.0.2:9000")) },
                &ctx(),
                ActionName::UploadProcessed,
            )
            .await;
        assert_eq!(result.unwrap_err().category(), ErrorCategory::Network);
    }
}
