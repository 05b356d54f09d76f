//! Per-attempt delay policy for the reverse-geocode retry loop.
//!
//! Two distinct delay rules apply, and they stack:
//! - a standard exponential backoff before every attempt after the
//!   first, regardless of why the previous attempt failed;
//! - an escalating penalty slept after an explicit HTTP 429, before
//!   the backoff of the next attempt.
//!
//! Keeping the arithmetic here — instead of inline in the request loop
//! — lets tests pin the schedule without a clock or a transport.

use std::time::Duration;

/// Delay schedule for a bounded retry loop. Attempt indices are
/// zero-based.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total number of attempts (first try included).
    pub max_attempts: u32,
    /// Base for the exponential backoff.
    pub backoff_base: Duration,
    /// Unit for the escalating 429 penalty.
    pub rate_limit_penalty_unit: Duration,
}

impl RetryPolicy {
    /// Standard backoff slept before `attempt`: zero before the first,
    /// `base * 2^(attempt-1)` before the rest.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        self.backoff_base * 2u32.saturating_pow(attempt - 1)
    }

    /// Penalty slept after a 429 on `attempt`, additional to the next
    /// attempt's standard backoff: `(attempt + 1) * unit`.
    #[must_use]
    pub fn rate_limit_penalty(&self, attempt: u32) -> Duration {
        self.rate_limit_penalty_unit * (attempt + 1)
    }

    /// Whether `attempt` is the final one.
    #[must_use]
    pub const fn is_last_attempt(&self, attempt: u32) -> bool {
        attempt + 1 >= self.max_attempts
    }
}
