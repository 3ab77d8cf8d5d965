/*!
 * Wrap Options
 * Per-wrapper timing, timeout handling and observability settings
 */

use super::config::{validate_timing, GuardConfig};
use crate::core::errors::{GuardError, GuardResult, TimeoutError};
use crate::core::limits::{DEFAULT_LABEL, DEFAULT_MIN_DELAY};
use crate::monitoring::GuardStats;
use crate::scheduler::Scheduler;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Fallback invoked once with the timeout error
pub type TimeoutHandler = Box<dyn FnOnce(TimeoutError) + Send + 'static>;

/// Options accepted by [`wrap`](super::wrap)
pub struct WrapOptions {
    pub(crate) min_delay: Duration,
    pub(crate) timeout: Option<Duration>,
    pub(crate) on_timeout: Option<TimeoutHandler>,
    pub(crate) label: String,
    pub(crate) stats: Option<Arc<GuardStats>>,
    pub(crate) scheduler: Option<Arc<dyn Scheduler>>,
}

impl WrapOptions {
    pub fn new() -> Self {
        Self {
            min_delay: DEFAULT_MIN_DELAY,
            timeout: None,
            on_timeout: None,
            label: DEFAULT_LABEL.to_string(),
            stats: None,
            scheduler: None,
        }
    }

    /// Start from configured defaults
    pub fn from_config(config: &GuardConfig) -> Self {
        Self {
            min_delay: config.min_delay,
            timeout: config.timeout,
            label: config.label.clone(),
            ..Self::new()
        }
    }

    /// Calls arriving sooner than this after wrapping are deferred
    pub fn min_delay(mut self, min_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self
    }

    /// Fail if no call arrives within `timeout`
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Handler for the timeout path; without one the timeout is only logged
    pub fn on_timeout<H>(mut self, handler: H) -> Self
    where
        H: FnOnce(TimeoutError) + Send + 'static,
    {
        self.on_timeout = Some(Box::new(handler));
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Count this wrapper's lifecycle into a shared stats block
    pub fn stats(mut self, stats: Arc<GuardStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Use an explicit scheduler instead of the current tokio runtime
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub(crate) fn validate(&self) -> GuardResult<()> {
        validate_timing(self.min_delay, self.timeout)?;
        if self.label.is_empty() {
            return Err(GuardError::invalid("label must not be empty"));
        }
        if self.on_timeout.is_some() && self.timeout.is_none() {
            return Err(GuardError::invalid("on_timeout given without a timeout"));
        }
        Ok(())
    }
}

impl Default for WrapOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WrapOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapOptions")
            .field("min_delay", &self.min_delay)
            .field("timeout", &self.timeout)
            .field("on_timeout", &self.on_timeout.is_some())
            .field("label", &self.label)
            .field("stats", &self.stats.is_some())
            .field("scheduler", &self.scheduler.is_some())
            .finish()
    }
}
