/*!
 * Limits and Constants
 *
 * Centralized defaults for guarded callbacks.
 */

use std::time::Duration;

// =============================================================================
// WRAP DEFAULTS
// =============================================================================

/// Default minimum delay before a call may run inline
/// Zero still defers same-turn calls to the next scheduling turn
pub const DEFAULT_MIN_DELAY: Duration = Duration::ZERO;

/// Label used in logs and timeout errors when none is given
pub const DEFAULT_LABEL: &str = "callback";

/// Longest accepted timeout (24h)
/// Anything larger is almost certainly a unit mistake
pub const MAX_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Overrides the default minimum delay, in milliseconds
pub const ENV_MIN_DELAY_MS: &str = "CALLBACK_GUARD_MIN_DELAY_MS";

/// Enables a default timeout, in milliseconds
pub const ENV_TIMEOUT_MS: &str = "CALLBACK_GUARD_TIMEOUT_MS";

/// Switches tracing output to JSON when set to `1` or `true`
pub const ENV_TRACE_JSON: &str = "CALLBACK_GUARD_TRACE_JSON";
