/*!
 * Callback Guard Library
 * Asynchronous, at-most-once, timeout-aware completion callbacks on tokio
 */

pub mod callback;
pub mod core;
pub mod monitoring;
pub mod scheduler;

// Re-exports
pub use callback::{
    wrap, wrap_result, CallbackBuilder, CallbackState, DisposeGuard, GuardConfig, GuardedFn,
    WrapOptions,
};
pub use crate::core::{GuardError, GuardId, GuardResult, TimeoutError};
pub use monitoring::{init_tracing, GuardStats, GuardStatsSnapshot};
pub use scheduler::{Scheduler, Task, TokioScheduler};
