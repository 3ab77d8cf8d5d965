/*!
 * Callback Guard Configuration
 *
 * Process-wide defaults for new wrappers, optionally read from the environment.
 *
 * ## Example
 *
 * ```ignore
 * let config = GuardConfig::new()
 *     .with_min_delay(Duration::from_millis(5))
 *     .with_timeout(Duration::from_secs(2));
 * let guarded = wrap(on_done, WrapOptions::from_config(&config))?;
 * ```
 */

use crate::core::errors::{GuardError, GuardResult};
use crate::core::limits::{DEFAULT_LABEL, DEFAULT_MIN_DELAY, ENV_MIN_DELAY_MS, ENV_TIMEOUT_MS, MAX_TIMEOUT};
use std::time::Duration;

/// Defaults applied to wrappers built from this config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    /// Minimum delay before a call may run inline (default: 0)
    pub min_delay: Duration,

    /// Timeout for the first call (default: none)
    pub timeout: Option<Duration>,

    /// Label attached to logs and timeout errors
    pub label: String,
}

impl GuardConfig {
    /// Create default configuration
    pub fn new() -> Self {
        Self {
            min_delay: DEFAULT_MIN_DELAY,
            timeout: None,
            label: DEFAULT_LABEL.to_string(),
        }
    }

    /// Defaults overridden by `CALLBACK_GUARD_MIN_DELAY_MS` and `CALLBACK_GUARD_TIMEOUT_MS`
    ///
    /// # Errors
    ///
    /// Returns `GuardError::InvalidArgument` if a variable is set but not a
    /// millisecond count, or the resulting config fails validation.
    pub fn from_env() -> GuardResult<Self> {
        let mut config = Self::new();

        if let Some(ms) = read_millis(ENV_MIN_DELAY_MS)? {
            config.min_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = read_millis(ENV_TIMEOUT_MS)? {
            config.timeout = Some(Duration::from_millis(ms));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_min_delay(mut self, min_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Check the invariants every wrapper relies on
    pub fn validate(&self) -> GuardResult<()> {
        validate_timing(self.min_delay, self.timeout)?;
        if self.label.is_empty() {
            return Err(GuardError::invalid("label must not be empty"));
        }
        Ok(())
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Timing rules shared by configs and per-wrapper options
pub(crate) fn validate_timing(min_delay: Duration, timeout: Option<Duration>) -> GuardResult<()> {
    let Some(timeout) = timeout else {
        return Ok(());
    };

    if timeout.is_zero() {
        return Err(GuardError::invalid("timeout must be greater than zero"));
    }
    if timeout > MAX_TIMEOUT {
        return Err(GuardError::invalid(format!(
            "timeout {:?} exceeds maximum {:?}",
            timeout, MAX_TIMEOUT
        )));
    }
    if min_delay >= timeout {
        return Err(GuardError::invalid(format!(
            "min_delay {:?} must be shorter than timeout {:?}",
            min_delay, timeout
        )));
    }
    Ok(())
}

fn read_millis(var: &str) -> GuardResult<Option<u64>> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| GuardError::invalid(format!("{}={:?}: {}", var, raw, e))),
        Err(_) => Ok(None),
    }
}
