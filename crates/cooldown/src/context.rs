use std::fmt;

use crate::state::CooldownState;

/// Why a cooldown left the active state.
///
/// Handlers match on this instead of inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum StopCause {
    /// The deadline passed (timer fired or a sweep noticed it).
    #[error("cooldown expired")]
    Expired,
    /// Stopped explicitly by the caller.
    #[error("cooldown cancelled")]
    Cancelled,
    /// The owning sweep processor shut down.
    #[error("cooldown processor closed")]
    Closed,
}

/// One-shot context handed to a handler for a vetoable transition.
///
/// Carries the payload of the originating call, a read-only view of the
/// cooldown state as it was before the transition, and a cancel flag.
/// Calling [`cancel`](EventContext::cancel) aborts the transition.
pub struct EventContext<'a, T> {
    payload: &'a T,
    state: &'a CooldownState,
    cancelled: bool,
}

impl<'a, T> EventContext<'a, T> {
    pub(crate) fn new(payload: &'a T, state: &'a CooldownState) -> Self {
        Self {
            payload,
            state,
            cancelled: false,
        }
    }

    pub fn payload(&self) -> &T {
        self.payload
    }

    /// State snapshot. Safe to read from inside a handler, unlike the
    /// cooldown's own locking accessors.
    pub fn state(&self) -> &CooldownState {
        self.state
    }

    /// Veto the in-progress transition.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl<T: fmt::Debug> fmt::Debug for EventContext<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventContext")
            .field("payload", self.payload)
            .field("cancelled", &self.cancelled)
            .finish()
    }
}
