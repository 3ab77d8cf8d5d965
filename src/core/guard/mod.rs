/*!
 * Callback Guard Primitives
 *
 * Building blocks shared by every guarded callback.
 *
 * ## Design Principles
 *
 * 1. **Latch**: Terminal states are reached exactly once
 * 2. **Observable**: Lifecycle transitions emit tracing events
 * 3. **Cancellable**: Scheduled work is owned by a handle that can abort it
 *
 * ## Guard Types
 *
 * - **ScheduledHandle**: A pending boundary or timeout task
 * - **TimeoutContext**: Deadline bookkeeping for the timeout path
 *
 * ## Example
 *
 * ```ignore
 * let handle = scheduler.schedule(Duration::from_millis(100), task)?;
 * // Aborted automatically if dropped before it runs
 * handle.release()?;
 * ```
 */

mod scheduled;
mod timeout;
mod traits;

pub use scheduled::ScheduledHandle;
pub use timeout::{TimeoutContext, TimeoutPolicy};
pub use traits::{Guard, GuardDrop};

pub use crate::core::errors::{GuardError, GuardResult, TimeoutError};

use crate::core::id::GuardId;

/// Guard metadata for observability
#[derive(Debug, Clone)]
pub struct GuardMetadata {
    pub resource_type: &'static str,
    pub creation_time: std::time::Instant,
    pub guard_id: Option<GuardId>,
}

impl GuardMetadata {
    #[inline]
    pub fn new(resource_type: &'static str) -> Self {
        Self {
            resource_type,
            creation_time: std::time::Instant::now(),
            guard_id: None,
        }
    }

    #[inline]
    pub fn with_guard_id(mut self, id: GuardId) -> Self {
        self.guard_id = Some(id);
        self
    }
}
