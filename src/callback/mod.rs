/*!
 * Guarded Callbacks
 *
 * Trustworthy completion callbacks for code you do not control.
 *
 * ## Guarantees
 *
 * 1. **Never synchronous**: A call made in the same turn as `wrap` is parked
 *    and delivered on the next turn. The task that wrapped is never handed
 *    an inline delivery, even on a multi-threaded runtime
 * 2. **At most once**: The first call wins, every later call is a no-op
 * 3. **Timeout**: With a timeout set, silence turns into a `TimeoutError`
 * 4. **Cancellable**: `dispose` stops both the call and the timeout path
 *
 * ## Example
 *
 * ```ignore
 * let guarded = wrap(
 *     |(value,): (u32,)| println!("got {}", value),
 *     WrapOptions::new().timeout(Duration::from_millis(100)),
 * )?;
 *
 * guarded.call((1,)); // runs on the next turn
 * guarded.call((2,)); // ignored
 * ```
 */

pub mod config;
mod options;
mod state;
mod wrapper;

pub use config::GuardConfig;
pub use options::{TimeoutHandler, WrapOptions};
pub use state::CallbackState;
pub use wrapper::{wrap, wrap_result, CallbackBuilder, DisposeGuard, GuardedFn};
