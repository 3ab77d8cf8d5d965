/*!
 * Guard State Machine
 *
 * ```text
 * Idle --call--> Firing --boundary--> Fired
 *   |              (inline when the boundary already passed and the
 *   |               call comes from outside the wrapping context)
 *   +--timeout--> TimedOut
 *   +--dispose--> Disposed   (also from Firing)
 * ```
 *
 * All transitions run under the wrapper's lock; the user callback never does.
 */

use crate::core::errors::{GuardError, TimeoutError};
use crate::core::guard::{ScheduledHandle, TimeoutContext};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one guarded callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackState {
    /// Waiting for the first call
    Idle,
    /// First call captured, waiting for the boundary
    Firing,
    /// Callback ran with the first call's arguments
    Fired,
    /// Timeout won; callback will never run with real arguments
    TimedOut,
    /// Cancelled before settling
    Disposed,
}

impl CallbackState {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Fired | Self::TimedOut | Self::Disposed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Firing => "firing",
            Self::Fired => "fired",
            Self::TimedOut => "timed_out",
            Self::Disposed => "disposed",
        }
    }
}

impl fmt::Display for CallbackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives exactly one outcome: the first call's arguments or the timeout
pub(crate) type Sink<A> = Box<dyn FnOnce(Result<A, TimeoutError>) + Send + 'static>;

/// What the caller of `on_call` must do once the lock is released
pub(crate) enum CallAction<A> {
    Invoke(Sink<A>, A),
    /// Parked; the pending boundary task delivers it
    Deferred,
    /// Parked after the boundary; the caller must schedule a release task
    Dispatch,
}

/// Everything a disposal took out of the state, dropped outside the lock
pub(crate) struct Retired<A> {
    _sink: Option<Sink<A>>,
    _pending: Option<A>,
    _timer: Option<ScheduledHandle>,
    _boundary: Option<ScheduledHandle>,
}

/// Per-wrapper record, owned by the wrapper and mutated only under its lock
pub(crate) struct GuardState<A> {
    state: CallbackState,
    fired: bool,
    boundary_passed: bool,
    pending_args: Option<A>,
    sink: Option<Sink<A>>,
    timer_handle: Option<ScheduledHandle>,
    boundary_handle: Option<ScheduledHandle>,
    timeout: Option<TimeoutContext>,
}

impl<A> GuardState<A> {
    pub(crate) fn new(sink: Sink<A>, timeout: Option<TimeoutContext>) -> Self {
        Self {
            state: CallbackState::Idle,
            fired: false,
            boundary_passed: false,
            pending_args: None,
            sink: Some(sink),
            timer_handle: None,
            boundary_handle: None,
            timeout,
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> CallbackState {
        self.state
    }

    #[inline]
    pub(crate) fn fired(&self) -> bool {
        self.fired
    }

    /// Keep the handle of the task that will run `on_boundary`
    ///
    /// Detached instead when that task already ran.
    pub(crate) fn set_boundary_handle(&mut self, handle: ScheduledHandle) {
        let awaited = !self.boundary_passed || self.pending_args.is_some();
        if awaited && !self.state.is_terminal() {
            self.boundary_handle = Some(handle);
        } else {
            handle.detach();
        }
    }

    pub(crate) fn set_timer_handle(&mut self, handle: ScheduledHandle) {
        if self.state == CallbackState::Idle {
            self.timer_handle = Some(handle);
        } else {
            handle.detach();
        }
    }

    /// Latch the first call
    ///
    /// Cancels the pending timeout. Runs inline once the boundary passed,
    /// otherwise parks the arguments for the boundary task. A call from the
    /// wrapping context is always parked, since that context may still be in
    /// the turn that created the wrapper.
    pub(crate) fn on_call(
        &mut self,
        args: A,
        from_origin: bool,
    ) -> Result<CallAction<A>, GuardError> {
        match self.state {
            CallbackState::Idle => {}
            CallbackState::Firing | CallbackState::Fired => return Err(GuardError::AlreadyFired),
            other => return Err(GuardError::AlreadySettled(other.as_str())),
        }

        self.timer_handle.take();
        self.state = CallbackState::Firing;

        if self.boundary_passed && !from_origin {
            let sink = self.fire()?;
            return Ok(CallAction::Invoke(sink, args));
        }

        self.pending_args = Some(args);
        if self.boundary_passed {
            Ok(CallAction::Dispatch)
        } else {
            Ok(CallAction::Deferred)
        }
    }

    /// The boundary (or release) task ran; deliver a parked call if there is one
    pub(crate) fn on_boundary(&mut self) -> Option<(Sink<A>, A)> {
        self.boundary_passed = true;
        if let Some(handle) = self.boundary_handle.take() {
            handle.detach();
        }

        if self.state != CallbackState::Firing {
            return None;
        }
        let args = self.pending_args.take()?;
        self.fire().ok().map(|sink| (sink, args))
    }

    /// The timeout task ran; only wins from `Idle`
    pub(crate) fn on_timeout(&mut self) -> Result<(Sink<A>, TimeoutError), GuardError> {
        if let Some(handle) = self.timer_handle.take() {
            handle.detach();
        }

        match self.state {
            CallbackState::Idle => {}
            CallbackState::Firing | CallbackState::Fired => return Err(GuardError::AlreadyFired),
            other => return Err(GuardError::AlreadySettled(other.as_str())),
        }

        let error = match &self.timeout {
            Some(ctx) => ctx.timeout_error(),
            None => return Err(GuardError::OperationFailed("timeout task without deadline".into())),
        };

        let sink = self.take_sink()?;
        self.state = CallbackState::TimedOut;
        self.boundary_handle.take();
        Ok((sink, error))
    }

    /// Cancel everything; `None` if already terminal
    pub(crate) fn dispose(&mut self) -> Option<Retired<A>> {
        if self.state.is_terminal() {
            return None;
        }
        self.state = CallbackState::Disposed;

        Some(Retired {
            _sink: self.sink.take(),
            _pending: self.pending_args.take(),
            _timer: self.timer_handle.take(),
            _boundary: self.boundary_handle.take(),
        })
    }

    fn fire(&mut self) -> Result<Sink<A>, GuardError> {
        let sink = self.take_sink()?;
        self.state = CallbackState::Fired;
        Ok(sink)
    }

    fn take_sink(&mut self) -> Result<Sink<A>, GuardError> {
        if self.fired {
            return Err(GuardError::AlreadyFired);
        }
        let sink = self.sink.take().ok_or(GuardError::AlreadyFired)?;
        self.fired = true;
        Ok(sink)
    }
}
