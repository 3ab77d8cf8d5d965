/*!
 * Scheduler Module
 * Host scheduling primitive: run on next turn, run after duration
 */

pub mod runtime;
mod task;
pub mod traits;

// Re-export public API
pub use runtime::{CallerContext, TokioScheduler};
pub use task::Task;
pub use traits::Scheduler;
