use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use cooldown_core::CooldownError;

use crate::context::StopCause;

use super::metrics::SweepMetrics;
use super::Sweepable;

/// Polls registered cooldowns and stops the expired ones.
///
/// Membership is keyed by cooldown id, so registering and
/// [`remove`](Self::remove) are idempotent. Cooldowns register themselves
/// when started and unregister when they stop, so a member is present
/// exactly while its cooldown is active unless it was detached.
///
/// Handlers of expiring cooldowns run on the tracking task: a slow handler
/// delays the rest of that sweep.
pub struct SweepProcessor {
    members: Mutex<HashMap<Uuid, Weak<dyn Sweepable>>>,
    running: AtomicBool,
    closed: AtomicBool,
    shutdown: watch::Sender<bool>,
    metrics: Mutex<SweepMetrics>,
}

/// Clears the running flag however the tracking loop ends.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SweepProcessor {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            members: Mutex::new(HashMap::new()),
            running: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            shutdown,
            metrics: Mutex::new(SweepMetrics::default()),
        }
    }

    /// Sweep every `every` until [`close`](Self::close) is called.
    ///
    /// Fails immediately when `every` is zero, when another tracking loop
    /// is live, or when the processor is already closed.
    pub async fn start_tracking(&self, every: Duration) -> Result<(), CooldownError> {
        if every.is_zero() {
            return Err(CooldownError::InvalidInterval(every));
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(CooldownError::ProcessorClosed);
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(CooldownError::AlreadyRunning);
        }
        let _running = RunningGuard(&self.running);

        let mut shutdown = self.shutdown.subscribe();
        if *shutdown.borrow() {
            return Err(CooldownError::ProcessorClosed);
        }

        info!(interval = ?every, "sweep processor tracking started");
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    self.sweep();
                }
            }
        }

        info!("sweep processor tracking stopped");
        Ok(())
    }

    /// Run [`start_tracking`](Self::start_tracking) on a new task.
    pub fn spawn_tracking(self: &Arc<Self>, every: Duration) -> JoinHandle<Result<(), CooldownError>> {
        let processor = Arc::clone(self);
        tokio::spawn(async move { processor.start_tracking(every).await })
    }

    /// One pass over the members. Returns how many expired.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        // Snapshot so member callbacks never run under the membership lock.
        let snapshot: Vec<(Uuid, Weak<dyn Sweepable>)> = lock(&self.members)
            .iter()
            .map(|(id, member)| (*id, Weak::clone(member)))
            .collect();

        let mut expired = 0;
        let mut dead = Vec::new();
        for (id, member) in snapshot {
            match member.upgrade() {
                Some(member) => {
                    if member.expire_if_due(now) {
                        expired += 1;
                    }
                }
                None => dead.push(id),
            }
        }

        if !dead.is_empty() {
            let mut members = lock(&self.members);
            for id in &dead {
                members.remove(id);
            }
        }

        lock(&self.metrics).record_sweep(expired, dead.len());
        if expired > 0 {
            debug!(expired, "sweep stopped expired cooldowns");
        }
        expired
    }

    pub(crate) fn append(&self, id: Uuid, member: Weak<dyn Sweepable>) -> bool {
        if self.closed.load(Ordering::SeqCst) {
            warn!(cooldown_id = %id, "sweep processor closed, cooldown will not be tracked");
            return false;
        }
        lock(&self.members).entry(id).or_insert(member);
        true
    }

    /// Stop polling the cooldown `id`. Returns whether it was a member.
    ///
    /// The cooldown itself stays active: it settles as expired on its next
    /// operation, and a renew or restart registers it again.
    pub fn remove(&self, id: Uuid) -> bool {
        lock(&self.members).remove(&id).is_some()
    }

    /// Stop tracking. Idempotent.
    ///
    /// When the tracking loop is live it is cancelled and every remaining
    /// member is stopped with [`StopCause::Closed`]. Otherwise membership is
    /// simply cleared; those cooldowns settle as expired on their next
    /// operation.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let was_running = self.running();
        self.shutdown.send_replace(true);
        let members = std::mem::take(&mut *lock(&self.members));

        if !was_running {
            debug!(cleared = members.len(), "idle sweep processor closed");
            return;
        }

        let mut closed = 0;
        for member in members.into_values() {
            if let Some(member) = member.upgrade() {
                if member.force_stop(StopCause::Closed) {
                    closed += 1;
                }
            }
        }
        lock(&self.metrics).record_close(closed);
        info!(closed, "sweep processor closed");
    }

    pub fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        lock(&self.members).contains_key(&id)
    }

    pub fn len(&self) -> usize {
        lock(&self.members).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.members).is_empty()
    }

    pub fn metrics(&self) -> SweepMetrics {
        lock(&self.metrics).clone()
    }
}

impl Default for SweepProcessor {
    fn default() -> Self {
        Self::new()
    }
}
