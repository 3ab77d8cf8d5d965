/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Result type for guard operations
pub type GuardResult<T> = Result<T, GuardError>;

/// Delivered to the timeout handler when no call arrived in time
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[error("Callback '{label}' timed out after {elapsed_ms}ms")]
#[diagnostic(
    code(callback::timeout),
    help("The wrapped callback was never called within its timeout. Check the code that owns it.")
)]
pub struct TimeoutError {
    pub label: String,
    pub elapsed_ms: u64,
    pub timeout_ms: Option<u64>,
}

impl TimeoutError {
    pub fn new(label: impl Into<String>, elapsed: Duration, timeout: Option<Duration>) -> Self {
        Self {
            label: label.into(),
            elapsed_ms: saturating_millis(elapsed),
            timeout_ms: timeout.map(saturating_millis),
        }
    }
}

fn saturating_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Errors that can occur while constructing or settling a guarded callback
///
/// Only `InvalidArgument` and `SchedulerUnavailable` are ever returned to the
/// caller of `wrap`. `Timeout` travels through the timeout channel, and the
/// latch results are swallowed inside the wrapper.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum GuardError {
    #[error("Invalid argument: {0}")]
    #[diagnostic(
        code(callback::invalid_argument),
        help("Wrap options are validated at construction time. Check the callback, timeout and min_delay.")
    )]
    InvalidArgument(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Timeout(#[from] TimeoutError),

    #[error("Callback already fired")]
    #[diagnostic(code(callback::already_fired))]
    AlreadyFired,

    #[error("Callback already settled as {0}")]
    #[diagnostic(code(callback::already_settled))]
    AlreadySettled(&'static str),

    #[error("No scheduler available: {0}")]
    #[diagnostic(
        code(callback::scheduler_unavailable),
        help("Wrap callbacks from inside a tokio runtime, or pass an explicit scheduler.")
    )]
    SchedulerUnavailable(String),

    #[error("Resource already released")]
    #[diagnostic(code(callback::already_released))]
    AlreadyReleased,

    #[error("Operation failed: {0}")]
    #[diagnostic(code(callback::operation_failed))]
    OperationFailed(String),
}

impl GuardError {
    /// Shorthand for construction-time validation failures
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
