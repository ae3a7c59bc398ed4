//! Centrally polled expiration detection.
//!
//! A [`SweepProcessor`] tracks a set of cooldowns and, on every tick of its
//! tracking loop, force-stops the ones whose deadline has passed. Many
//! cooldowns then share one loop instead of each owning a timer task.
//!
//! The processor is a value the application constructs, shares through an
//! `Arc`, and starts and closes explicitly.

mod metrics;
mod processor;

use tokio::time::Instant;

use crate::context::StopCause;

pub use self::metrics::SweepMetrics;
pub use self::processor::SweepProcessor;

/// A cooldown as seen by the processor.
///
/// Implementations take their own lock; the processor never holds its
/// membership lock while calling them.
pub(crate) trait Sweepable: Send + Sync {
    /// Stop with [`StopCause::Expired`] if registered, unpaused, and at or past
    /// its deadline at `now`.
    fn expire_if_due(&self, now: Instant) -> bool;

    /// Stop unconditionally with `cause` if active.
    fn force_stop(&self, cause: StopCause) -> bool;
}
