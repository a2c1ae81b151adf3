//! Retry Policy
//!
//! Table-driven decision of how a failed request chain continues.

use std::time::Duration;

use crate::error::ErrorKind;

/// What to do after a request failed with a given [`ErrorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDecision {
    /// Total attempts for the chain, including the first
    pub max_attempts: u32,
    /// Pause before the next attempt
    pub backoff: Duration,
    /// Obtain a new access token before replaying
    pub refresh_first: bool,
}

impl RetryDecision {
    /// Fail on the first error.
    pub const fn once() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
            refresh_first: false,
        }
    }

    pub const fn retry(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
            refresh_first: false,
        }
    }

    /// One silent refresh, then a single replay.
    pub const fn refresh_then_replay() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::ZERO,
            refresh_first: true,
        }
    }
}

/// Per-kind retry table, evaluated once per failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub network: RetryDecision,
    pub unauthorized: RetryDecision,
    pub status: RetryDecision,
    pub decode: RetryDecision,
}

impl RetryPolicy {
    pub fn decide(&self, kind: ErrorKind) -> RetryDecision {
        match kind {
            ErrorKind::Network => self.network,
            ErrorKind::Unauthorized => self.unauthorized,
            ErrorKind::Status => self.status,
            ErrorKind::Decode => self.decode,
            ErrorKind::Terminal => RetryDecision::once(),
        }
    }

    /// Retries network failures with a fixed pause.
    pub fn with_network_retries(mut self, max_attempts: u32, backoff: Duration) -> Self {
        self.network = RetryDecision::retry(max_attempts.max(1), backoff);
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            network: RetryDecision::once(),
            unauthorized: RetryDecision::refresh_then_replay(),
            status: RetryDecision::once(),
            decode: RetryDecision::once(),
        }
    }
}
