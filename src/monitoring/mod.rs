/*!
 * Monitoring
 * Structured tracing and lock-free statistics for guarded callbacks
 */

mod stats;
mod tracer;

pub use stats::{GuardStats, GuardStatsSnapshot};
pub use tracer::{init_tracing, CallbackSpan};
