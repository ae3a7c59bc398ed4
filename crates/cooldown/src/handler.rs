use std::time::Duration;

use crate::context::{EventContext, StopCause};

/// Callbacks invoked at each cooldown transition.
///
/// Every method has a no-op default, so implementors override only what
/// they care about. Start, renew, pause and resume may be vetoed through
/// [`EventContext::cancel`]; stop is informational.
///
/// # Reentrancy
///
/// Handlers run while the cooldown's exclusive lock is held. A handler must
/// never call back into the same cooldown (`start`, `stop`, `active`, ...):
/// doing so deadlocks. Use [`EventContext::state`] to inspect the instance.
pub trait CooldownHandler<T>: Send + Sync {
    fn handle_start(&self, _ctx: &mut EventContext<'_, T>, _duration: Duration) {}

    fn handle_renew(&self, _ctx: &mut EventContext<'_, T>, _duration: Duration) {}

    fn handle_pause(&self, _ctx: &mut EventContext<'_, T>) {}

    fn handle_resume(&self, _ctx: &mut EventContext<'_, T>) {}

    /// Called periodically while a timer-driven cooldown runs, never while
    /// paused. `tick` counts from 1 since the last start or renew and
    /// carries on across a pause. `payload` is always `T::default()`.
    fn handle_tick(&self, _tick: u64, _payload: &T) {}

    /// `payload` is the caller's payload for [`StopCause::Cancelled`] and
    /// `T::default()` for expiry and processor shutdown.
    fn handle_stop(&self, _cause: StopCause, _payload: &T) {}
}

/// Handler that does nothing. Installed whenever no handler is supplied.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopHandler;

impl<T> CooldownHandler<T> for NopHandler {}
