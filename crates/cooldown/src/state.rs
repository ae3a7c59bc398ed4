//! Minimal expiration bookkeeping shared by every cooldown flavour.
//!
//! [`CooldownState`] only knows about instants: it has no handler, no
//! trigger and no lock. [`Cooldown`](crate::Cooldown) wraps it with the
//! concurrency policy.

use std::time::Duration;

use tokio::time::Instant;

/// Expiration instant plus an optional pause instant.
///
/// `paused_at` is only ever set while `expiration` is set, and both are
/// cleared together by [`reset`](CooldownState::reset).
///
/// Instants come from [`tokio::time::Instant`] so a paused test clock
/// drives them deterministically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CooldownState {
    expiration: Option<Instant>,
    paused_at: Option<Instant>,
}

impl CooldownState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm for `duration` from now. A zero duration resets instead.
    pub fn set(&mut self, duration: Duration) {
        self.set_at(duration, Instant::now());
    }

    pub fn set_at(&mut self, duration: Duration, now: Instant) {
        if duration.is_zero() {
            self.reset();
            return;
        }
        self.expiration = Some(now + duration);
        self.paused_at = None;
    }

    pub fn reset(&mut self) {
        self.expiration = None;
        self.paused_at = None;
    }

    /// Freeze the remaining time. Returns `false` unless active and not paused.
    pub fn pause(&mut self) -> bool {
        self.pause_at(Instant::now())
    }

    pub fn pause_at(&mut self, now: Instant) -> bool {
        if self.paused() || !self.active_at(now) {
            return false;
        }
        self.paused_at = Some(now);
        true
    }

    /// Clear the pause instant, leaving the expiration untouched.
    ///
    /// The caller is responsible for shifting the deadline by the time spent
    /// paused (see [`Cooldown::resume`](crate::Cooldown::resume)).
    pub fn resume(&mut self) -> bool {
        if !self.paused() {
            return false;
        }
        self.paused_at = None;
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        if self.paused() {
            self.resume()
        } else {
            self.pause()
        }
    }

    pub fn paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn active(&self) -> bool {
        self.active_at(Instant::now())
    }

    /// Active while the expiration has not passed the reference instant,
    /// which is the pause instant when paused and `now` otherwise.
    pub fn active_at(&self, now: Instant) -> bool {
        match self.expiration {
            Some(expiration) => expiration >= self.paused_at.unwrap_or(now),
            None => false,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.remaining_at(Instant::now())
    }

    /// Frozen while paused, `expiration - now` while running, zero otherwise.
    pub fn remaining_at(&self, now: Instant) -> Duration {
        match (self.expiration, self.paused_at) {
            (Some(expiration), Some(paused_at)) => expiration.saturating_duration_since(paused_at),
            (Some(expiration), None) => expiration.saturating_duration_since(now),
            _ => Duration::ZERO,
        }
    }

    pub fn expiration(&self) -> Option<Instant> {
        self.expiration
    }

    pub fn paused_at(&self) -> Option<Instant> {
        self.paused_at
    }

    /// Deadline set, not paused, and reached at `now`. Polled expiry uses
    /// this so a deadline landing exactly on a tick is caught on that tick,
    /// the same instant a timer would fire.
    pub(crate) fn due_at(&self, now: Instant) -> bool {
        match self.expiration {
            Some(expiration) => self.paused_at.is_none() && expiration <= now,
            None => false,
        }
    }

    /// Deadline set, not paused, and already in the past.
    pub(crate) fn elapsed_at(&self, now: Instant) -> bool {
        match self.expiration {
            Some(expiration) => self.paused_at.is_none() && expiration < now,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_state_is_inactive() {
        let state = CooldownState::new();
        assert!(!state.active());
        assert!(!state.paused());
        assert_eq!(state.remaining(), Duration::ZERO);
    }

    #[test]
    fn set_and_reset() {
        let mut state = CooldownState::new();
        state.set(Duration::from_secs(1));
        assert!(state.active());
        assert!(state.remaining() <= Duration::from_secs(1));
        assert!(state.remaining() > Duration::ZERO);

        state.reset();
        assert!(!state.active());
        assert_eq!(state.remaining(), Duration::ZERO);
    }

    #[test]
    fn zero_duration_resets() {
        let mut state = CooldownState::new();
        state.set(Duration::from_secs(1));
        state.set(Duration::ZERO);
        assert!(!state.active());
        assert_eq!(state.expiration(), None);
    }

    #[test]
    fn expires_after_deadline() {
        let now = Instant::now();
        let mut state = CooldownState::new();
        state.set_at(Duration::from_millis(100), now);

        assert!(state.active_at(now + Duration::from_millis(100)));
        assert!(!state.active_at(now + Duration::from_millis(101)));
        assert_eq!(state.remaining_at(now + Duration::from_millis(150)), Duration::ZERO);
        assert!(state.elapsed_at(now + Duration::from_millis(101)));
    }

    #[test]
    fn due_on_the_exact_deadline() {
        let now = Instant::now();
        let mut state = CooldownState::new();
        state.set_at(Duration::from_millis(20), now);

        let deadline = now + Duration::from_millis(20);
        assert!(!state.due_at(now + Duration::from_millis(19)));
        assert!(state.due_at(deadline));
        assert!(!state.elapsed_at(deadline));

        state.pause_at(now + Duration::from_millis(5));
        assert!(!state.due_at(deadline));
    }

    #[test]
    fn pause_freezes_remaining() {
        let now = Instant::now();
        let mut state = CooldownState::new();
        state.set_at(Duration::from_secs(10), now);
        assert!(state.pause_at(now + Duration::from_secs(4)));

        // Far past the original deadline, still active with 6s frozen.
        let later = now + Duration::from_secs(60);
        assert!(state.active_at(later));
        assert_eq!(state.remaining_at(later), Duration::from_secs(6));
        assert!(!state.elapsed_at(later));
    }

    #[test]
    fn pause_twice_is_rejected() {
        let mut state = CooldownState::new();
        state.set(Duration::from_secs(1));
        assert!(state.pause());
        assert!(!state.pause());
    }

    #[test]
    fn inactive_pause_resume_toggle_are_noops() {
        let mut state = CooldownState::new();
        assert!(!state.pause());
        assert!(!state.resume());
        assert!(!state.toggle_pause());
        assert_eq!(state, CooldownState::new());
    }

    #[test]
    fn resume_keeps_expiration() {
        let mut state = CooldownState::new();
        state.set(Duration::from_secs(1));
        let expiration = state.expiration();
        assert!(state.pause());
        assert!(state.resume());
        assert!(!state.paused());
        assert_eq!(state.expiration(), expiration);
    }

    #[test]
    fn toggle_alternates() {
        let mut state = CooldownState::new();
        state.set(Duration::from_secs(5));
        assert!(state.toggle_pause());
        assert!(state.paused());
        assert!(state.toggle_pause());
        assert!(!state.paused());
        assert!(state.toggle_pause());
        assert!(state.paused());
    }

    #[test]
    fn reset_clears_pause_together() {
        let mut state = CooldownState::new();
        state.set(Duration::from_secs(5));
        state.pause();
        state.reset();
        assert_eq!(state.expiration(), None);
        assert_eq!(state.paused_at(), None);
    }
}
