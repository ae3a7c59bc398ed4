use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CooldownError {
    #[error("no tokio runtime available to drive the expiration timer")]
    NoRuntime,

    #[error("sweep processor is already tracking")]
    AlreadyRunning,

    #[error("sweep processor is closed")]
    ProcessorClosed,

    #[error("invalid tick interval: {0:?}")]
    InvalidInterval(Duration),

    #[error("expiration trigger armed while another one is outstanding (race or bug)")]
    TriggerAlreadyArmed,

    #[error("active cooldown has no expiration trigger (missed cleanup)")]
    TriggerMissing,

    #[error("active cooldown has no recorded duration")]
    MissingDuration,

    #[error("config error: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),
}
