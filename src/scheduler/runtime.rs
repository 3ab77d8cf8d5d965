/*!
 * Tokio Scheduler
 * Scheduler backed by a tokio runtime handle
 */

use super::{Scheduler, Task};
use crate::core::guard::{GuardError, GuardResult, ScheduledHandle};
use std::thread::{self, ThreadId};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task;

/// The tokio task, or the thread outside any task, that is currently running
///
/// `block_on` futures have no task id, so they are told apart by thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallerContext {
    Task(task::Id),
    Thread(ThreadId),
}

impl CallerContext {
    pub fn current() -> Self {
        match task::try_id() {
            Some(id) => Self::Task(id),
            None => Self::Thread(thread::current().id()),
        }
    }
}

/// Schedules tasks with `tokio::spawn` on a captured runtime handle
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Capture the runtime the caller is running in
    ///
    /// # Errors
    ///
    /// Returns `GuardError::SchedulerUnavailable` outside a tokio runtime
    pub fn current() -> GuardResult<Self> {
        Handle::try_current()
            .map(Self::from_handle)
            .map_err(|e| GuardError::SchedulerUnavailable(e.to_string()))
    }

    pub fn from_handle(handle: Handle) -> Self {
        Self { handle }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> GuardResult<ScheduledHandle> {
        let join = self.handle.spawn(async move {
            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(delay).await;
            }
            task.run();
        });

        Ok(ScheduledHandle::from_handle(join, "scheduled_task", delay))
    }
}
