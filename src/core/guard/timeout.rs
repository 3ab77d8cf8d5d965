/*!
 * Timeout Bookkeeping
 *
 * Deadline tracking for the timeout path of a guarded callback.
 *
 * ## Example
 *
 * ```ignore
 * let ctx = TimeoutContext::new(TimeoutPolicy::After(Duration::from_millis(100)), "fetch");
 * // ...later, from the timeout task
 * let err = ctx.timeout_error();
 * ```
 */

use super::TimeoutError;
use std::time::Duration;
use tokio::time::Instant;

/// Timeout policy for a guarded callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeoutPolicy {
    /// No timeout (the callback may wait forever)
    #[default]
    None,

    /// Fail if no call arrives within the duration
    After(Duration),
}

impl TimeoutPolicy {
    /// Get the duration for this policy
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::After(d) => Some(*d),
        }
    }
}

/// Timeout context for tracking timeout state
///
/// Measured on tokio's clock, the same one the deadline task sleeps on.
#[derive(Debug, Clone)]
pub struct TimeoutContext {
    policy: TimeoutPolicy,
    start: Instant,
    label: String,
}

impl TimeoutContext {
    /// Create new timeout context, starting the clock now
    pub fn new(policy: TimeoutPolicy, label: impl Into<String>) -> Self {
        Self {
            policy,
            start: Instant::now(),
            label: label.into(),
        }
    }

    /// Get elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Build the error delivered when the deadline wins
    pub fn timeout_error(&self) -> TimeoutError {
        TimeoutError::new(self.label.clone(), self.elapsed(), self.policy.duration())
    }
}
