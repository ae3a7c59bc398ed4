//! Generic payload-carrying cooldown.
//!
//! A [`Cooldown`] composes a [`CooldownState`](crate::CooldownState) with a
//! duration, a pluggable [`CooldownHandler`](crate::CooldownHandler) and a
//! per-instance lock. Expiration is detected either by a Tokio timer owned by
//! the instance or by a shared [`SweepProcessor`](crate::SweepProcessor).
//!
//! Split into focused submodules:
//! - `core`: Cooldown handle, shared state, locking and read accessors
//! - `builder`: construction and strategy selection
//! - `guard`: every state transition, run under the exclusive lock
//! - `trigger`: arming and cancelling the expiration trigger

mod builder;
mod core;
mod guard;
mod trigger;

pub use self::builder::CooldownBuilder;
pub use self::core::Cooldown;
pub use self::guard::CooldownGuard;

/// Cooldown without a payload.
pub type PlainCooldown = Cooldown<()>;
