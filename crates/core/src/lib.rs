pub mod config;
pub mod error;

pub use config::{
    load_dotenv, tick_period, Config, CooldownConfig, SweepConfig, MAX_TICKS_PER_SECOND,
};
pub use error::*;
