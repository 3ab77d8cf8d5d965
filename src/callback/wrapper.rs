/*!
 * Guarded Callback Wrapper
 *
 * Wraps a completion function so that it:
 * - never runs synchronously inside the turn that created it
 * - runs at most once, with the first call's arguments
 * - reports a `TimeoutError` if nobody calls it in time
 *
 * ## Example
 *
 * ```ignore
 * let guarded = wrap(
 *     |(status,): (u16,)| println!("done: {}", status),
 *     WrapOptions::new()
 *         .timeout(Duration::from_secs(5))
 *         .on_timeout(|err| eprintln!("{}", err)),
 * )?;
 *
 * third_party_api(guarded.clone());
 * ```
 */

use super::options::WrapOptions;
use super::state::{CallAction, CallbackState, GuardState, Sink};
use crate::core::errors::{GuardError, GuardResult, TimeoutError};
use crate::core::guard::{Guard, GuardDrop, GuardMetadata, TimeoutContext, TimeoutPolicy};
use crate::core::id::GuardId;
use crate::monitoring::{CallbackSpan, GuardStats};
use crate::scheduler::{CallerContext, Scheduler, Task, TokioScheduler};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Wrap `f` so it fires asynchronously, at most once, with an optional timeout
///
/// # Errors
///
/// - `GuardError::InvalidArgument` if the options are inconsistent
/// - `GuardError::SchedulerUnavailable` if no scheduler was given and the
///   caller is not inside a tokio runtime
pub fn wrap<A, F>(f: F, mut options: WrapOptions) -> GuardResult<GuardedFn<A>>
where
    A: Send + 'static,
    F: FnOnce(A) + Send + 'static,
{
    options.validate()?;

    let on_timeout = options.on_timeout.take();
    let sink: Sink<A> = Box::new(move |outcome| match outcome {
        Ok(args) => f(args),
        Err(err) => match on_timeout {
            Some(handler) => handler(err),
            None => report_unhandled_timeout(&err),
        },
    });

    GuardedFn::from_sink(sink, options)
}

/// Wrap `f` to receive either the first call's arguments or the timeout
///
/// Exactly one of `Ok(args)` or `Err(TimeoutError)` is ever delivered.
///
/// # Errors
///
/// Same as [`wrap`]; additionally rejects an `on_timeout` handler, since the
/// timeout is delivered to `f` itself.
pub fn wrap_result<A, F>(f: F, options: WrapOptions) -> GuardResult<GuardedFn<A>>
where
    A: Send + 'static,
    F: FnOnce(Result<A, TimeoutError>) + Send + 'static,
{
    if options.on_timeout.is_some() {
        return Err(GuardError::invalid(
            "on_timeout conflicts with wrap_result; the callback receives the timeout",
        ));
    }
    options.validate()?;

    GuardedFn::from_sink(Box::new(f), options)
}

fn report_unhandled_timeout(err: &TimeoutError) {
    warn!(
        label = %err.label,
        elapsed_ms = err.elapsed_ms,
        timeout_ms = ?err.timeout_ms,
        "callback timed out with no timeout handler"
    );
}

struct Inner<A> {
    id: GuardId,
    label: String,
    origin: CallerContext,
    scheduler: Arc<dyn Scheduler>,
    state: Mutex<GuardState<A>>,
    stats: Option<Arc<GuardStats>>,
    metadata: GuardMetadata,
    span: CallbackSpan,
}

/// Callable handle produced by [`wrap`]
///
/// Clones share one state, so racing completions obey the same latch.
/// Dropping every handle does not cancel the timeout; use
/// [`GuardedFn::dispose`] for that.
pub struct GuardedFn<A> {
    inner: Arc<Inner<A>>,
}

impl<A> Clone for GuardedFn<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: Send + 'static> GuardedFn<A> {
    /// Start a builder; the callback itself is required
    pub fn builder() -> CallbackBuilder<A> {
        CallbackBuilder::new()
    }

    fn from_sink(sink: Sink<A>, options: WrapOptions) -> GuardResult<Self> {
        let scheduler: Arc<dyn Scheduler> = match options.scheduler {
            Some(scheduler) => scheduler,
            None => Arc::new(TokioScheduler::current()?),
        };

        let id = GuardId::generate();
        let timeout = options
            .timeout
            .map(|d| TimeoutContext::new(TimeoutPolicy::After(d), options.label.clone()));

        let inner = Arc::new(Inner {
            id,
            span: CallbackSpan::new(id, &options.label),
            metadata: GuardMetadata::new("guarded_callback").with_guard_id(id),
            label: options.label,
            origin: CallerContext::current(),
            scheduler: Arc::clone(&scheduler),
            state: Mutex::new(GuardState::new(sink, timeout)),
            stats: options.stats,
        });

        let boundary = {
            let inner = Arc::clone(&inner);
            scheduler.schedule(options.min_delay, Task::new(move || inner.on_boundary()))?
        };
        inner.state.lock().set_boundary_handle(boundary);

        if let Some(duration) = options.timeout {
            let timer = {
                let inner = Arc::clone(&inner);
                scheduler.schedule(duration, Task::new(move || inner.on_timeout()))?
            };
            inner.state.lock().set_timer_handle(timer);
        }

        if let Some(stats) = &inner.stats {
            stats.inc_wrapped();
        }
        {
            let _entered = inner.span.enter();
            debug!(
                min_delay_ms = duration_ms(options.min_delay),
                timeout_ms = ?options.timeout.map(duration_ms),
                "callback wrapped"
            );
        }

        Ok(Self { inner })
    }

    /// Deliver the completion
    ///
    /// The first call wins. Before the boundary it is parked and runs on the
    /// next turn; after it, the callback runs inline. Calls from the task (or
    /// thread) that created the wrapper are always delivered on a later turn.
    /// Later calls, and calls after a timeout or disposal, are dropped
    /// silently.
    pub fn call(&self, args: A) {
        let from_origin = CallerContext::current() == self.inner.origin;
        let action = self.inner.state.lock().on_call(args, from_origin);

        match action {
            Ok(CallAction::Invoke(sink, args)) => self.inner.invoke(sink, Ok(args)),
            Ok(CallAction::Deferred) => {
                self.inner.count_deferred();
                let _entered = self.inner.span.enter();
                trace!("call parked until the next turn");
            }
            Ok(CallAction::Dispatch) => {
                self.inner.count_deferred();
                self.dispatch();
            }
            Err(reason) => self.inner.ignore(&reason),
        }
    }

    /// Schedule delivery of a call parked after the boundary
    fn dispatch(&self) {
        let release = {
            let inner = Arc::clone(&self.inner);
            self.inner
                .scheduler
                .defer(Task::new(move || inner.on_boundary()))
        };

        match release {
            Ok(handle) => {
                self.inner.state.lock().set_boundary_handle(handle);
                let _entered = self.inner.span.enter();
                trace!("call from the wrapping context released on the next turn");
            }
            Err(err) => {
                let _entered = self.inner.span.enter();
                warn!(%err, "could not schedule delivery, disposing callback");
                self.inner.dispose();
            }
        }
    }

    /// Cancel the pending call and timeout
    ///
    /// Returns `false` if the callback had already settled.
    pub fn dispose(&self) -> bool {
        self.inner.dispose()
    }

    /// Dispose automatically when the returned guard drops
    pub fn dispose_on_drop(&self) -> DisposeGuard<A> {
        DisposeGuard {
            guarded: self.clone(),
            armed: true,
        }
    }

    pub fn state(&self) -> CallbackState {
        self.inner.state.lock().state()
    }

    /// True once fired, timed out or disposed
    pub fn is_settled(&self) -> bool {
        self.state().is_terminal()
    }

    pub fn id(&self) -> GuardId {
        self.inner.id
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn metadata(&self) -> &GuardMetadata {
        &self.inner.metadata
    }
}

impl<A: Send + 'static> Inner<A> {
    fn on_boundary(&self) {
        let ready = self.state.lock().on_boundary();
        if let Some((sink, args)) = ready {
            self.invoke(sink, Ok(args));
        }
    }

    fn on_timeout(&self) {
        let outcome = self.state.lock().on_timeout();
        match outcome {
            Ok((sink, err)) => {
                if let Some(stats) = &self.stats {
                    stats.inc_timed_out();
                }
                self.span.record_outcome(CallbackState::TimedOut.as_str());
                let _entered = self.span.enter();
                sink(Err(err));
            }
            Err(reason) => {
                let _entered = self.span.enter();
                trace!(%reason, "timeout lost the race");
            }
        }
    }

    fn invoke(&self, sink: Sink<A>, outcome: Result<A, TimeoutError>) {
        if let Some(stats) = &self.stats {
            stats.inc_invoked();
        }
        self.span.record_outcome(CallbackState::Fired.as_str());
        let _entered = self.span.enter();
        sink(outcome);
    }

    fn count_deferred(&self) {
        if let Some(stats) = &self.stats {
            stats.inc_deferred();
        }
    }

    fn ignore(&self, reason: &GuardError) {
        if let Some(stats) = &self.stats {
            stats.inc_ignored();
        }
        let _entered = self.span.enter();
        trace!(%reason, "redundant call ignored");
    }

    fn dispose(&self) -> bool {
        let retired = self.state.lock().dispose();
        match retired {
            Some(retired) => {
                drop(retired);
                if let Some(stats) = &self.stats {
                    stats.inc_disposed();
                }
                self.span.record_outcome(CallbackState::Disposed.as_str());
                true
            }
            None => false,
        }
    }
}

impl<A> fmt::Debug for GuardedFn<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("GuardedFn")
            .field("id", &self.inner.id)
            .field("label", &self.inner.label)
            .field("state", &state.state())
            .field("fired", &state.fired())
            .finish()
    }
}

/// Disposes its callback when dropped unless it already settled
pub struct DisposeGuard<A: Send + 'static> {
    guarded: GuardedFn<A>,
    armed: bool,
}

impl<A: Send + 'static> DisposeGuard<A> {
    /// Keep the callback alive past this guard
    pub fn disarm(mut self) -> GuardedFn<A> {
        self.armed = false;
        self.guarded.clone()
    }
}

impl<A: Send + 'static> Guard for DisposeGuard<A> {
    fn resource_type(&self) -> &'static str {
        "guarded_callback"
    }

    fn metadata(&self) -> &GuardMetadata {
        self.guarded.metadata()
    }

    fn is_active(&self) -> bool {
        self.armed && !self.guarded.is_settled()
    }

    fn release(&mut self) -> GuardResult<()> {
        if !self.armed {
            return Err(GuardError::AlreadyReleased);
        }
        self.armed = false;
        if self.guarded.dispose() {
            Ok(())
        } else {
            Err(GuardError::AlreadyReleased)
        }
    }
}

impl<A: Send + 'static> GuardDrop for DisposeGuard<A> {
    fn on_drop(&mut self) {
        if self.armed && self.guarded.dispose() {
            debug!(guard_id = %self.guarded.id(), "callback disposed on drop");
        }
    }
}

impl<A: Send + 'static> Drop for DisposeGuard<A> {
    fn drop(&mut self) {
        self.on_drop();
    }
}

/// Fluent construction of a [`GuardedFn`]
pub struct CallbackBuilder<A> {
    callback: Option<Box<dyn FnOnce(A) + Send + 'static>>,
    options: WrapOptions,
}

impl<A: Send + 'static> CallbackBuilder<A> {
    pub fn new() -> Self {
        Self {
            callback: None,
            options: WrapOptions::new(),
        }
    }

    pub fn callback<F>(mut self, f: F) -> Self
    where
        F: FnOnce(A) + Send + 'static,
    {
        self.callback = Some(Box::new(f));
        self
    }

    pub fn options(mut self, options: WrapOptions) -> Self {
        self.options = options;
        self
    }

    pub fn min_delay(mut self, min_delay: Duration) -> Self {
        self.options = self.options.min_delay(min_delay);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.timeout(timeout);
        self
    }

    pub fn on_timeout<H>(mut self, handler: H) -> Self
    where
        H: FnOnce(TimeoutError) + Send + 'static,
    {
        self.options = self.options.on_timeout(handler);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.options = self.options.label(label);
        self
    }

    pub fn stats(mut self, stats: Arc<GuardStats>) -> Self {
        self.options = self.options.stats(stats);
        self
    }

    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.options = self.options.scheduler(scheduler);
        self
    }

    /// # Errors
    ///
    /// `GuardError::InvalidArgument` if no callback was set, plus everything
    /// [`wrap`] can return.
    pub fn build(self) -> GuardResult<GuardedFn<A>> {
        let callback = self
            .callback
            .ok_or_else(|| GuardError::invalid("callback is required"))?;
        wrap(callback, self.options)
    }
}

impl<A: Send + 'static> Default for CallbackBuilder<A> {
    fn default() -> Self {
        Self::new()
    }
}
