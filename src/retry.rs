//! Bounded retry policy with linear backoff.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How many times a fetch is retried and how long to wait in between.
///
/// The wait before retry `n` (0-based) is `base_ms + n * step_ms`, so with
/// the defaults a failing URL is tried three times with 0.5s and 1.0s pauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Constant part of the backoff in milliseconds.
    #[serde(default = "default_base_ms")]
    pub base_ms: u64,
    /// Per-attempt increment of the backoff in milliseconds.
    #[serde(default = "default_step_ms")]
    pub step_ms: u64,
}

fn default_max_retries() -> u32 {
    2
}

fn default_base_ms() -> u64 {
    500
}

fn default_step_ms() -> u64 {
    500
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_ms: default_base_ms(),
            step_ms: default_step_ms(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries and never waits.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_ms: 0,
            step_ms: 0,
        }
    }

    /// Total number of attempts, including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay to wait before retry number `retry` (0-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let step = self.step_ms.saturating_mul(u64::from(retry));
        Duration::from_millis(self.base_ms.saturating_add(step))
    }

    /// Returns true if another attempt is allowed after `attempts_made`.
    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts()
    }
}
