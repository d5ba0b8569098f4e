// src/retry.rs

//! Retry policy attached to individual tasks.
//!
//! The delay before retry attempt `n + 1` is `delay × factor^(n - 1)`,
//! clamped to `max_delay`. With `factor = 1.0` (the default) every retry
//! waits the same fixed delay, which matches the common case of "retry a
//! flaky database step a few times with a short pause".

use std::time::Duration;

/// How a task is retried after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first (`>= 1`).
    pub max_attempts: u32,
    /// Base delay before the first retry.
    pub delay: Duration,
    /// Multiplicative growth factor applied per retry (`1.0` = fixed delay).
    pub factor: f64,
    /// Cap on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
            factor: 1.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Whether another attempt is allowed after `attempt` attempts have run.
    pub fn attempts_remain(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay to wait before re-running after the given failed attempt
    /// (1-indexed: `attempt = 1` is the first execution).
    ///
    /// The base is derived purely from the attempt number, so delays never
    /// feed back into later calculations.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let max_secs = self.max_delay.as_secs_f64();
        let unclamped = self.delay.as_secs_f64() * self.factor.powi(exponent);

        if !unclamped.is_finite() || unclamped < 0.0 || unclamped > max_secs {
            self.max_delay
        } else {
            Duration::from_secs_f64(unclamped)
        }
    }
}
