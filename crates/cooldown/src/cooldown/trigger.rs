use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::warn;

use cooldown_core::CooldownError;

use crate::sweep::{SweepProcessor, Sweepable};

use super::core::Shared;
use super::guard::CooldownGuard;

/// How a cooldown learns that its deadline passed.
pub(crate) enum Expiry {
    /// A task on this runtime sleeps until the deadline.
    Timer(Handle),
    /// The shared processor polls for expiration.
    Sweep(Arc<SweepProcessor>),
}

/// The outstanding expiration trigger. At most one exists per instance.
pub(crate) enum Trigger {
    Timer(AbortHandle),
    Swept,
}

impl<T> CooldownGuard<'_, T> {
    /// Cancel the outstanding trigger, if any.
    pub(super) fn disarm(&mut self) {
        match self.inner.trigger.take() {
            Some(Trigger::Timer(handle)) => handle.abort(),
            Some(Trigger::Swept) => {
                if let Expiry::Sweep(processor) = &self.shared.expiry {
                    processor.remove(self.shared.id);
                }
            }
            None => {}
        }
    }

    /// Forget the trigger without cancelling it. Used by the timer task
    /// that is itself the trigger.
    pub(super) fn take_trigger(&mut self) {
        self.inner.trigger = None;
    }

    pub(super) fn owns_timer(&self, epoch: u64) -> bool {
        self.inner.epoch == epoch && matches!(self.inner.trigger, Some(Trigger::Timer(_)))
    }

    pub(super) fn is_swept(&self) -> bool {
        matches!(self.inner.trigger, Some(Trigger::Swept))
    }

    pub(super) fn has_trigger(&self) -> bool {
        self.inner.trigger.is_some()
    }

    /// Report an internal invariant violation: panic in strict mode,
    /// otherwise log and let the caller recover.
    pub(super) fn violation(&self, err: CooldownError) {
        if self.shared.strict {
            panic!("cooldown {}: {}", self.shared.id, err);
        }
        warn!(cooldown_id = %self.shared.id, error = %err, "recovering from cooldown invariant violation");
    }
}

impl<T: Default + 'static> CooldownGuard<'_, T> {
    /// Arm a trigger for the current expiration instant.
    pub(super) fn arm(&mut self) {
        let Some(deadline) = self.inner.state.expiration() else {
            return;
        };
        if self.has_trigger() {
            self.violation(CooldownError::TriggerAlreadyArmed);
            self.disarm();
        }

        self.inner.epoch = self.inner.epoch.wrapping_add(1);
        let trigger = match &self.shared.expiry {
            Expiry::Timer(runtime) => {
                let task = runtime.spawn(run_timer(
                    Weak::clone(&self.shared.this),
                    self.inner.epoch,
                    deadline,
                    self.shared.tick_period,
                ));
                Trigger::Timer(task.abort_handle())
            }
            Expiry::Sweep(processor) => {
                let member: Weak<dyn Sweepable> = self.shared.this.clone();
                processor.append(self.shared.id, member);
                Trigger::Swept
            }
        };
        self.inner.trigger = Some(trigger);
    }
}

/// Timer task: ticks the handler every `tick_period` until `deadline`, then
/// expires the cooldown. Exits early once `epoch` is no longer the armed one.
async fn run_timer<T: Default + 'static>(
    shared: Weak<Shared<T>>,
    epoch: u64,
    deadline: Instant,
    tick_period: Option<Duration>,
) {
    let expiry = tokio::time::sleep_until(deadline);
    tokio::pin!(expiry);
    let mut ticker = tick_period.map(|period| {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });

    loop {
        tokio::select! {
            // Expiry wins a tie with the last tick.
            biased;
            _ = &mut expiry => {
                if let Some(shared) = shared.upgrade() {
                    shared.on_timer(epoch);
                }
                return;
            }
            _ = next_tick(&mut ticker) => {
                let Some(shared) = shared.upgrade() else {
                    return;
                };
                if !shared.on_tick(epoch) {
                    return;
                }
            }
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
