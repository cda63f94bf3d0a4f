//! Fixed-delay retry bookkeeping for a single send request.

use std::time::Duration;

/// How many times a transiently failing send is repeated, and how long to wait in between.
///
/// The delay is constant: there is no backoff growth and no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`.
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Replace `max_retries` when the caller supplied an override.
    pub fn with_max_retries(self, max_retries: Option<u32>) -> Self {
        Self {
            max_retries: max_retries.unwrap_or(self.max_retries),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for `delay`, then make attempt `next_attempt` (0-based).
    Retry { next_attempt: u32, delay: Duration },
    /// The bound is reached; `attempts` calls were made in total.
    GiveUp { attempts: u32 },
}

/// Attempt counter owned by one in-flight request.
#[derive(Debug)]
pub struct RetryState {
    attempt: u32,
    policy: RetryPolicy,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { attempt: 0, policy }
    }

    /// Current attempt, 0-based.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Attempts made so far, counting the current one.
    pub fn attempts_made(&self) -> u32 {
        self.attempt.saturating_add(1)
    }

    pub fn max_attempts(&self) -> u32 {
        self.policy.max_retries.saturating_add(1)
    }

    /// Record a transient failure of the current attempt.
    pub fn on_transient_failure(&mut self) -> RetryDecision {
        if self.attempt >= self.policy.max_retries {
            return RetryDecision::GiveUp {
                attempts: self.attempts_made(),
            };
        }
        self.attempt += 1;
        RetryDecision::Retry {
            next_attempt: self.attempt,
            delay: self.policy.retry_delay,
        }
    }
}
