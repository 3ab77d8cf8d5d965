/*!
 * Scheduler Traits
 * The host scheduling primitive as seen by guarded callbacks
 */

use super::Task;
use crate::core::guard::{GuardResult, ScheduledHandle};
use std::time::Duration;

/// Deferred execution on the host runtime
///
/// Guarded callbacks only ever need two things from the host:
/// - run a task on the next scheduling turn (`delay == 0`)
/// - run a task after a duration
pub trait Scheduler: Send + Sync {
    /// Schedule `task` to run after `delay`
    ///
    /// A zero delay must still run the task on a later turn, never inline.
    /// Dropping the returned handle cancels the task if it has not run.
    fn schedule(&self, delay: Duration, task: Task) -> GuardResult<ScheduledHandle>;

    /// Schedule `task` on the next turn
    fn defer(&self, task: Task) -> GuardResult<ScheduledHandle> {
        self.schedule(Duration::ZERO, task)
    }
}
