//! Timed on/off lockouts with pause, renew, and vetoable transition hooks.
//!
//! A [`Cooldown`] tracks "blocked until T" for one entity or resource.
//! Expiration is driven either by a timer task owned by the cooldown or by a
//! shared [`SweepProcessor`] that polls many cooldowns from a single loop.

pub mod context;
pub mod cooldown;
pub mod handler;
pub mod state;
pub mod sweep;

pub use context::{EventContext, StopCause};
pub use cooldown::{Cooldown, CooldownBuilder, CooldownGuard, PlainCooldown};
pub use cooldown_core::{load_dotenv, Config, CooldownConfig, CooldownError, SweepConfig};
pub use handler::{CooldownHandler, NopHandler};
pub use state::CooldownState;
pub use sweep::{SweepMetrics, SweepProcessor};
