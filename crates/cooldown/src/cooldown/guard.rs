use std::sync::{Arc, RwLockWriteGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use cooldown_core::CooldownError;

use crate::context::{EventContext, StopCause};
use crate::handler::{CooldownHandler, NopHandler};
use crate::state::CooldownState;

use super::core::{Inner, Shared};
use super::trigger::Expiry;

/// Exclusive access to a [`Cooldown`](super::Cooldown).
///
/// Holds the instance lock for its whole lifetime; every method here is
/// the lock-already-held counterpart of the method with the same name on
/// `Cooldown`.
pub struct CooldownGuard<'a, T> {
    pub(super) shared: &'a Shared<T>,
    pub(super) inner: RwLockWriteGuard<'a, Inner<T>>,
}

impl<'a, T> CooldownGuard<'a, T> {
    pub(super) fn new(shared: &'a Shared<T>, inner: RwLockWriteGuard<'a, Inner<T>>) -> Self {
        Self { shared, inner }
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn state(&self) -> &CooldownState {
        &self.inner.state
    }

    pub fn active(&self) -> bool {
        self.inner.state.active()
    }

    pub fn paused(&self) -> bool {
        self.inner.state.paused()
    }

    pub fn remaining(&self) -> Duration {
        self.inner.state.remaining()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.inner.duration
    }

    pub fn ticks(&self) -> u64 {
        self.inner.ticks
    }

    pub fn handler(&self) -> Arc<dyn CooldownHandler<T>> {
        Arc::clone(&self.inner.handler)
    }

    pub fn handle(&mut self, handler: Option<Arc<dyn CooldownHandler<T>>>) {
        self.inner.handler = handler.unwrap_or_else(|| Arc::new(NopHandler));
    }

    /// Drop all tracking without notifying the handler.
    pub(super) fn release(&mut self) {
        self.inner.state.reset();
        self.inner.duration = None;
        self.inner.ticks = 0;
        self.disarm();
    }
}

impl<T: Default + 'static> CooldownGuard<'_, T> {
    pub fn start(&mut self, duration: Duration, payload: T) -> bool {
        let now = Instant::now();
        self.settle(now);
        if duration.is_zero() || self.inner.state.active_at(now) {
            return false;
        }

        let handler = self.handler();
        let mut ctx = EventContext::new(&payload, &self.inner.state);
        handler.handle_start(&mut ctx, duration);
        if ctx.is_cancelled() {
            debug!(cooldown_id = %self.shared.id, "cooldown start vetoed");
            return false;
        }

        self.inner.duration = Some(duration);
        self.inner.ticks = 0;
        self.inner.state.set(duration);
        self.arm();
        debug!(cooldown_id = %self.shared.id, ?duration, "cooldown started");
        true
    }

    pub fn restart(&mut self, duration: Duration, payload: T) -> bool {
        if duration.is_zero() {
            return false;
        }
        let now = Instant::now();
        self.settle(now);
        if self.inner.state.active_at(now) {
            self.finish(StopCause::Cancelled, &payload);
        }
        self.start(duration, payload)
    }

    pub fn renew(&mut self, payload: T) -> bool {
        let now = Instant::now();
        self.settle(now);
        if !self.inner.state.active_at(now) || self.inner.state.paused() {
            return false;
        }
        let Some(duration) = self.inner.duration else {
            self.violation(CooldownError::MissingDuration);
            return false;
        };

        let handler = self.handler();
        let mut ctx = EventContext::new(&payload, &self.inner.state);
        handler.handle_renew(&mut ctx, duration);
        if ctx.is_cancelled() {
            debug!(cooldown_id = %self.shared.id, "cooldown renew vetoed");
            return false;
        }

        self.inner.state.set(duration);
        self.inner.ticks = 0;
        if self.has_trigger() {
            self.disarm();
        } else {
            self.violation(CooldownError::TriggerMissing);
        }
        self.arm();
        debug!(cooldown_id = %self.shared.id, ?duration, "cooldown renewed");
        true
    }

    pub fn pause(&mut self, payload: T) -> bool {
        let now = Instant::now();
        self.settle(now);
        if !self.inner.state.active_at(now) || self.inner.state.paused() {
            return false;
        }

        let handler = self.handler();
        let mut ctx = EventContext::new(&payload, &self.inner.state);
        handler.handle_pause(&mut ctx);
        if ctx.is_cancelled() {
            debug!(cooldown_id = %self.shared.id, "cooldown pause vetoed");
            return false;
        }

        self.inner.state.pause_at(now);
        // A polled cooldown stays registered: the sweep skips paused members.
        if let Expiry::Timer(_) = self.shared.expiry {
            self.disarm();
        }
        debug!(cooldown_id = %self.shared.id, remaining = ?self.inner.state.remaining(), "cooldown paused");
        true
    }

    pub fn resume(&mut self, payload: T) -> bool {
        if !self.inner.state.paused() {
            return false;
        }

        let handler = self.handler();
        let mut ctx = EventContext::new(&payload, &self.inner.state);
        handler.handle_resume(&mut ctx);
        if ctx.is_cancelled() {
            debug!(cooldown_id = %self.shared.id, "cooldown resume vetoed");
            return false;
        }

        let remaining = self.inner.state.remaining();
        self.inner.state.resume();
        if remaining.is_zero() {
            // Paused exactly on the deadline: nothing left to wait for.
            self.finish(StopCause::Expired, &T::default());
            return true;
        }

        // Shift the deadline by the time spent paused.
        self.inner.state.set(remaining);
        match self.shared.expiry {
            Expiry::Timer(_) => self.arm(),
            Expiry::Sweep(_) => {
                if !self.is_swept() {
                    self.violation(CooldownError::TriggerMissing);
                    self.arm();
                }
            }
        }
        debug!(cooldown_id = %self.shared.id, ?remaining, "cooldown resumed");
        true
    }

    pub fn toggle_pause(&mut self, payload: T) -> bool {
        if self.inner.state.paused() {
            self.resume(payload)
        } else {
            self.pause(payload)
        }
    }

    pub fn stop(&mut self, payload: T) -> bool {
        let now = Instant::now();
        self.settle(now);
        if !self.inner.state.active_at(now) {
            return false;
        }
        self.finish(StopCause::Cancelled, &payload);
        true
    }

    pub(super) fn tick(&mut self) {
        self.inner.ticks += 1;
        let handler = self.handler();
        handler.handle_tick(self.inner.ticks, &T::default());
    }

    /// Notify the handler and return to inactive.
    pub(super) fn finish(&mut self, cause: StopCause, payload: &T) {
        let handler = self.handler();
        handler.handle_stop(cause, payload);
        self.release();
        debug!(cooldown_id = %self.shared.id, %cause, "cooldown stopped");
    }

    /// Deliver a pending expiry whose trigger has not fired yet, so that no
    /// transition ever arms a second trigger next to a live one.
    fn settle(&mut self, now: Instant) {
        if self.inner.state.elapsed_at(now) {
            self.finish(StopCause::Expired, &T::default());
        }
    }
}
