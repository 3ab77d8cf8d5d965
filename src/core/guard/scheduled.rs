/*!
 * Scheduled Task Handles
 *
 * RAII handles for boundary and timeout tasks with automatic cancellation
 */

use super::traits::{Guard, GuardDrop};
use super::{GuardError, GuardMetadata, GuardResult};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Handle to a task parked on the scheduler
///
/// Aborts the task when dropped unless it already ran or was detached.
///
/// # Example
///
/// ```ignore
/// let handle = ScheduledHandle::from_handle(tokio::spawn(work), "timeout", delay);
/// // Task automatically cancelled if handle drops
/// ```
pub struct ScheduledHandle {
    handle: Option<JoinHandle<()>>,
    delay: Duration,
    metadata: GuardMetadata,
}

impl ScheduledHandle {
    /// Wrap a spawned task
    pub fn from_handle(handle: JoinHandle<()>, kind: &'static str, delay: Duration) -> Self {
        Self {
            handle: Some(handle),
            delay,
            metadata: GuardMetadata::new(kind),
        }
    }

    /// Let the task run to completion without keeping a handle to it
    pub fn detach(mut self) {
        self.handle.take();
    }

    /// Check if task is finished
    pub fn is_finished(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| h.is_finished())
            .unwrap_or(true)
    }

    /// Abort the task
    pub fn abort(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }

    /// Await the task, reporting aborts and panics as errors
    pub async fn join(mut self) -> GuardResult<()> {
        match self.handle.take() {
            Some(handle) => handle
                .await
                .map_err(|e| GuardError::OperationFailed(format!("Task join error: {:?}", e))),
            None => Err(GuardError::AlreadyReleased),
        }
    }
}

impl Guard for ScheduledHandle {
    fn resource_type(&self) -> &'static str {
        self.metadata.resource_type
    }

    fn metadata(&self) -> &GuardMetadata {
        &self.metadata
    }

    fn is_active(&self) -> bool {
        self.handle.is_some() && !self.is_finished()
    }

    fn release(&mut self) -> GuardResult<()> {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            Ok(())
        } else {
            Err(GuardError::AlreadyReleased)
        }
    }
}

impl GuardDrop for ScheduledHandle {
    fn on_drop(&mut self) {
        if self.is_active() {
            self.abort();
            tracing::trace!(
                kind = self.metadata.resource_type,
                delay_ms = u64::try_from(self.delay.as_millis()).unwrap_or(u64::MAX),
                "scheduled task cancelled on drop"
            );
        }
    }
}

impl Drop for ScheduledHandle {
    fn drop(&mut self) {
        self.on_drop();
    }
}

impl std::fmt::Debug for ScheduledHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledHandle")
            .field("kind", &self.metadata.resource_type)
            .field("delay", &self.delay)
            .field("active", &self.is_active())
            .finish()
    }
}
