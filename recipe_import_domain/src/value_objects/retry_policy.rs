// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Retry Policy
//!
//! Attempt limits and exponential backoff arithmetic for job retries.
//!
//! The policy is pure domain logic: the error handler combines it with the
//! error's type-level retryability to decide between reschedule and terminal
//! failure, and asks it for the delay before the next attempt. Backoff is
//! `min(base × 2^attempt, max)` with saturating arithmetic, so the curve is
//! monotone and bounded for every attempt count.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default maximum retry attempts per job.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default backoff base.
pub const DEFAULT_BASE_BACKOFF_MS: u64 = 1_000;
/// Default backoff ceiling.
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 30_000;

/// Retry limits and backoff shape for one queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum attempts before a job fails terminally.
    pub max_retries: u32,
    /// First-retry delay in milliseconds.
    pub base_backoff_ms: u64,
    /// Backoff ceiling in milliseconds.
    pub max_backoff_ms: u64,
}

impl RetryPolicy {
    /// Creates a policy, clamping a zero base up to one millisecond so the
    /// doubling curve stays monotone.
    pub fn new(max_retries: u32, base_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            base_backoff_ms: base_backoff_ms.max(1),
            max_backoff_ms: max_backoff_ms.max(base_backoff_ms.max(1)),
        }
    }

    /// Whether the given zero-based attempt count has exhausted the budget.
    pub fn attempts_exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_retries
    }

    /// Backoff before the next attempt: `min(base × 2^attempt, max)`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let delay_ms = self
            .base_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_RETRIES,
            DEFAULT_BASE_BACKOFF_MS,
            DEFAULT_MAX_BACKOFF_MS,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_backoff_doubles_until_ceiling() {
        let policy = RetryPolicy::new(5, 1_000, 30_000);
        assert_eq!(policy.backoff_for(0), Duration::from_millis(1_000));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(2_000));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(4_000));
        assert_eq!(policy.backoff_for(4), Duration::from_millis(16_000));
        assert_eq!(policy.backoff_for(5), Duration::from_millis(30_000));
        assert_eq!(policy.backoff_for(64), Duration::from_millis(30_000));
    }

    #[test]
    fn test_attempts_exhausted_boundary() {
        let policy = RetryPolicy::new(3, 1_000, 30_000);
        assert!(!policy.attempts_exhausted(2));
        assert!(policy.attempts_exhausted(3));
        assert!(policy.attempts_exhausted(4));
    }

    #[test]
    fn test_defaults_match_configuration_contract() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_backoff_ms, 1_000);
        assert_eq!(policy.max_backoff_ms, 30_000);
    }

    proptest! {
        #[test]
        fn prop_backoff_is_monotone_and_bounded(
            base in 1u64..10_000,
            max in 1u64..120_000,
            attempt in 0u32..128,
        ) {
            let policy = RetryPolicy::new(3, base, max);
            let current = policy.backoff_for(attempt);
            let next = policy.backoff_for(attempt + 1);
            prop_assert!(current <= next);
            prop_assert!(current <= Duration::from_millis(policy.max_backoff_ms));
        }
    }
}
