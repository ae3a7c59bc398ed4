use chrono::{DateTime, Utc};
use serde::Serialize;

/// Sweep processor counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepMetrics {
    /// Sweeps performed since construction.
    pub sweeps: u64,
    /// Cooldowns stopped with `Expired` by a sweep.
    pub expired: u64,
    /// Cooldowns stopped with `Closed` by `close`.
    pub closed: u64,
    /// Members whose cooldown was dropped without unregistering.
    pub pruned: u64,
    /// Wall-clock time of the last sweep.
    pub last_sweep: Option<DateTime<Utc>>,
}

impl SweepMetrics {
    pub(crate) fn record_sweep(&mut self, expired: usize, pruned: usize) {
        self.sweeps += 1;
        self.expired += expired as u64;
        self.pruned += pruned as u64;
        self.last_sweep = Some(Utc::now());
    }

    pub(crate) fn record_close(&mut self, closed: usize) {
        self.closed += closed as u64;
    }
}
