use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

use crate::context::StopCause;
use crate::handler::{CooldownHandler, NopHandler};
use crate::state::CooldownState;
use crate::sweep::Sweepable;

use super::builder::CooldownBuilder;
use super::guard::CooldownGuard;
use super::trigger::{Expiry, Trigger};

/// Timed on/off lockout with pause, renew and vetoable transitions.
///
/// All mutating operations take one exclusive per-instance lock, and the
/// handler runs while it is held (see [`CooldownHandler`] for the reentrancy
/// contract). Queries take the shared lock.
///
/// Dropping a cooldown cancels its timer or unregisters it from its sweep
/// processor. No stop notification is delivered on drop.
pub struct Cooldown<T> {
    pub(super) shared: Arc<Shared<T>>,
}

/// State reachable from the expiration trigger as well as from the handle.
pub(crate) struct Shared<T> {
    pub(super) id: Uuid,
    pub(super) strict: bool,
    pub(super) expiry: Expiry,
    /// Handler tick period for timer-driven instances.
    pub(super) tick_period: Option<Duration>,
    pub(super) inner: RwLock<Inner<T>>,
    /// Handed to timers and processors so they never keep the instance alive.
    pub(super) this: Weak<Shared<T>>,
}

pub(crate) struct Inner<T> {
    pub(super) state: CooldownState,
    /// Last configured span; `Some` only while active.
    pub(super) duration: Option<Duration>,
    pub(super) handler: Arc<dyn CooldownHandler<T>>,
    pub(super) trigger: Option<Trigger>,
    /// Bumped on every arm so a late timer can recognise itself as stale.
    pub(super) epoch: u64,
    /// Handler ticks delivered since the last start or renew.
    pub(super) ticks: u64,
}

impl<T> Inner<T> {
    pub(super) fn new(handler: Arc<dyn CooldownHandler<T>>) -> Self {
        Self {
            state: CooldownState::new(),
            duration: None,
            handler,
            trigger: None,
            epoch: 0,
            ticks: 0,
        }
    }
}

impl<T> Shared<T> {
    pub(super) fn write(&self) -> RwLockWriteGuard<'_, Inner<T>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn read(&self) -> RwLockReadGuard<'_, Inner<T>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn lock(&self) -> CooldownGuard<'_, T> {
        CooldownGuard::new(self, self.write())
    }
}

impl<T: Default + 'static> Shared<T> {
    /// Timer callback. Ignored when the timer that fired is no longer the
    /// armed one.
    pub(super) fn on_timer(&self, epoch: u64) {
        let mut guard = self.lock();
        if !guard.owns_timer(epoch) {
            return;
        }
        guard.take_trigger();
        guard.finish(StopCause::Expired, &T::default());
    }

    /// Tick callback. Returns `false` once the timer that ticks is stale, so
    /// its task can exit.
    pub(super) fn on_tick(&self, epoch: u64) -> bool {
        let mut guard = self.lock();
        if !guard.owns_timer(epoch) {
            return false;
        }
        guard.tick();
        true
    }
}

impl<T: Default + 'static> Sweepable for Shared<T> {
    fn expire_if_due(&self, now: Instant) -> bool {
        let mut guard = self.lock();
        if !guard.is_swept() || !guard.state().due_at(now) {
            return false;
        }
        guard.finish(StopCause::Expired, &T::default());
        true
    }

    fn force_stop(&self, cause: StopCause) -> bool {
        let mut guard = self.lock();
        if guard.state().expiration().is_none() {
            return false;
        }
        guard.finish(cause, &T::default());
        true
    }
}

impl<T: Default + 'static> Cooldown<T> {
    /// Timer-driven cooldown on the current Tokio runtime with a no-op handler.
    pub fn new() -> Result<Self, cooldown_core::CooldownError> {
        Self::builder().build()
    }

    pub fn builder() -> CooldownBuilder<T> {
        CooldownBuilder::new()
    }

    /// Take the exclusive lock and return a guard exposing every operation.
    ///
    /// Use it to run several operations atomically. Calling any method of
    /// this cooldown while the guard is alive deadlocks.
    pub fn lock(&self) -> CooldownGuard<'_, T> {
        self.shared.lock()
    }

    /// Start for `duration`. Rejected when already active, when `duration`
    /// is zero, or when the handler vetoes.
    pub fn start(&self, duration: Duration, payload: T) -> bool {
        self.lock().start(duration, payload)
    }

    /// Stop (notifying [`StopCause::Cancelled`]) if active, then start anew.
    pub fn restart(&self, duration: Duration, payload: T) -> bool {
        self.lock().restart(duration, payload)
    }

    /// Re-arm for the recorded duration. Rejected while inactive or paused.
    pub fn renew(&self, payload: T) -> bool {
        self.lock().renew(payload)
    }

    pub fn pause(&self, payload: T) -> bool {
        self.lock().pause(payload)
    }

    pub fn resume(&self, payload: T) -> bool {
        self.lock().resume(payload)
    }

    pub fn toggle_pause(&self, payload: T) -> bool {
        self.lock().toggle_pause(payload)
    }

    /// Stop if active. Never vetoable.
    pub fn stop(&self, payload: T) -> bool {
        self.lock().stop(payload)
    }
}

impl<T> Cooldown<T> {
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn active(&self) -> bool {
        self.shared.read().state.active()
    }

    pub fn paused(&self) -> bool {
        self.shared.read().state.paused()
    }

    pub fn remaining(&self) -> Duration {
        self.shared.read().state.remaining()
    }

    /// Duration of the current window, `None` while inactive.
    pub fn duration(&self) -> Option<Duration> {
        self.shared.read().duration
    }

    /// Handler ticks delivered since the last start or renew.
    pub fn ticks(&self) -> u64 {
        self.shared.read().ticks
    }

    pub fn state(&self) -> CooldownState {
        self.shared.read().state
    }

    pub fn handler(&self) -> Arc<dyn CooldownHandler<T>> {
        Arc::clone(&self.shared.read().handler)
    }

    /// Replace the handler. `None` installs [`NopHandler`].
    pub fn handle(&self, handler: Option<Arc<dyn CooldownHandler<T>>>) {
        self.shared.write().handler = handler.unwrap_or_else(|| Arc::new(NopHandler));
    }

    pub fn is_strict(&self) -> bool {
        self.shared.strict
    }
}

impl<T> Drop for Cooldown<T> {
    fn drop(&mut self) {
        self.shared.lock().release();
    }
}

impl<T> std::fmt::Debug for Cooldown<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.read();
        f.debug_struct("Cooldown")
            .field("id", &self.shared.id)
            .field("state", &inner.state)
            .field("duration", &inner.duration)
            .finish()
    }
}
