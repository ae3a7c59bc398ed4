use std::sync::{Arc, RwLock};

use tokio::runtime::Handle;
use uuid::Uuid;

use cooldown_core::{CooldownConfig, CooldownError};

use crate::handler::{CooldownHandler, NopHandler};
use crate::sweep::SweepProcessor;

use super::core::{Cooldown, Inner, Shared};
use super::trigger::Expiry;

/// Fluent builder for a [`Cooldown`].
///
/// # Example
/// ```
/// use std::sync::Arc;
///
/// use cooldown::{Cooldown, CooldownError, NopHandler, SweepProcessor};
///
/// # fn main() -> Result<(), CooldownError> {
/// let processor = Arc::new(SweepProcessor::new());
/// let cooldown = Cooldown::<u32>::builder()
///     .handler(NopHandler)
///     .sweep(Arc::clone(&processor))
///     .build()?;
/// assert!(!cooldown.active());
/// # Ok(())
/// # }
/// ```
pub struct CooldownBuilder<T> {
    handler: Option<Arc<dyn CooldownHandler<T>>>,
    strict: bool,
    ticks_per_second: u32,
    runtime: Option<Handle>,
    processor: Option<Arc<SweepProcessor>>,
}

impl<T: Default + 'static> CooldownBuilder<T> {
    pub fn new() -> Self {
        Self {
            handler: None,
            strict: false,
            ticks_per_second: CooldownConfig::default().ticks_per_second,
            runtime: None,
            processor: None,
        }
    }

    pub fn handler(self, handler: impl CooldownHandler<T> + 'static) -> Self {
        self.shared_handler(Arc::new(handler))
    }

    /// Install a handler that may be shared between several cooldowns.
    pub fn shared_handler(mut self, handler: Arc<dyn CooldownHandler<T>>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Panic on internal invariant violations (default: log and recover).
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Handler tick rate while a timer-driven cooldown runs (default 20).
    /// `0` disables ticking. Sweep-driven cooldowns never tick.
    pub fn ticks_per_second(mut self, ticks_per_second: u32) -> Self {
        self.ticks_per_second = ticks_per_second;
        self
    }

    pub fn config(mut self, config: &CooldownConfig) -> Self {
        self.strict = config.strict;
        self.ticks_per_second = config.ticks_per_second;
        self
    }

    /// Runtime for the expiration timer (default: the current runtime).
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Let `processor` detect expiration instead of a per-instance timer.
    pub fn sweep(mut self, processor: Arc<SweepProcessor>) -> Self {
        self.processor = Some(processor);
        self
    }

    /// Fails with [`CooldownError::NoRuntime`] for a timer-driven cooldown
    /// built outside a Tokio runtime without an explicit handle.
    pub fn build(self) -> Result<Cooldown<T>, CooldownError> {
        let expiry = match (self.processor, self.runtime) {
            (Some(processor), _) => Expiry::Sweep(processor),
            (None, Some(runtime)) => Expiry::Timer(runtime),
            (None, None) => {
                Expiry::Timer(Handle::try_current().map_err(|_| CooldownError::NoRuntime)?)
            }
        };
        let tick_period = match expiry {
            Expiry::Timer(_) => cooldown_core::tick_period(self.ticks_per_second),
            Expiry::Sweep(_) => None,
        };
        let handler = self.handler.unwrap_or_else(|| Arc::new(NopHandler));
        let strict = self.strict;

        let shared = Arc::new_cyclic(|this| Shared {
            id: Uuid::new_v4(),
            strict,
            expiry,
            tick_period,
            inner: RwLock::new(Inner::new(handler)),
            this: this.clone(),
        });
        Ok(Cooldown { shared })
    }
}

impl<T: Default + 'static> Default for CooldownBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
