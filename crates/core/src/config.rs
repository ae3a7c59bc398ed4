use std::env;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CooldownError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ── Top-level config ──────────────────────────────────────────

/// Full configuration for cooldowns and the shared sweep processor.
///
/// Parsed from TOML with support for environment variable overrides:
///
/// ```toml
/// [cooldown]
/// strict = false
/// ticks_per_second = 20
///
/// [sweep]
/// tick_interval_ms = 50
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cooldown: CooldownConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
}

/// Per-instance cooldown options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooldownConfig {
    /// Panic on internal invariant violations instead of logging and recovering.
    #[serde(default)]
    pub strict: bool,
    /// Handler tick rate of timer-driven cooldowns. `0` disables ticking.
    #[serde(default = "default_ticks_per_second")]
    pub ticks_per_second: u32,
}

fn default_ticks_per_second() -> u32 {
    20
}

/// Upper bound keeping the tick period at one millisecond or more.
pub const MAX_TICKS_PER_SECOND: u32 = 1000;

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            strict: false,
            ticks_per_second: default_ticks_per_second(),
        }
    }
}

impl CooldownConfig {
    /// Time between two handler ticks, `None` when ticking is disabled.
    pub fn tick_period(&self) -> Option<Duration> {
        tick_period(self.ticks_per_second)
    }
}

/// `1s / ticks_per_second`, or `None` for zero or a rate above
/// [`MAX_TICKS_PER_SECOND`].
pub fn tick_period(ticks_per_second: u32) -> Option<Duration> {
    if ticks_per_second == 0 || ticks_per_second > MAX_TICKS_PER_SECOND {
        return None;
    }
    Some(Duration::from_secs(1) / ticks_per_second)
}

/// Sweep processor options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Interval between two sweeps, in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// 20 ticks per second.
fn default_tick_interval_ms() -> u64 {
    50
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl SweepConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Config {
    /// Parse config from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, CooldownError> {
        let mut config: Self = toml::from_str(toml_str)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CooldownError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Build config from defaults plus environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Result<Self, CooldownError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `COOLDOWN_*` environment overrides on top of the parsed values.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(env_opt);
    }

    /// Apply overrides from an arbitrary key lookup. Unparseable values are
    /// logged and ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("COOLDOWN_STRICT") {
            match parse_bool(&v) {
                Some(strict) => self.cooldown.strict = strict,
                None => warn!(value = %v, "ignoring invalid COOLDOWN_STRICT"),
            }
        }
        if let Some(v) = lookup("COOLDOWN_TICKS_PER_SECOND") {
            match v.trim().parse::<u32>() {
                Ok(n) => self.cooldown.ticks_per_second = n,
                Err(e) => warn!(value = %v, error = %e, "ignoring invalid COOLDOWN_TICKS_PER_SECOND"),
            }
        }
        if let Some(v) = lookup("COOLDOWN_SWEEP_TICK_MS") {
            match v.trim().parse::<u64>() {
                Ok(ms) => self.sweep.tick_interval_ms = ms,
                Err(e) => warn!(value = %v, error = %e, "ignoring invalid COOLDOWN_SWEEP_TICK_MS"),
            }
        }
    }

    pub fn validate(&self) -> Result<(), CooldownError> {
        if self.sweep.tick_interval_ms == 0 {
            return Err(CooldownError::Config(
                "sweep.tick_interval_ms must be greater than zero".into(),
            ));
        }
        if self.cooldown.ticks_per_second > MAX_TICKS_PER_SECOND {
            return Err(CooldownError::Config(format!(
                "cooldown.ticks_per_second must be at most {MAX_TICKS_PER_SECOND}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(!config.cooldown.strict);
        assert_eq!(config.cooldown.ticks_per_second, 20);
        assert_eq!(config.cooldown.tick_period(), Some(Duration::from_millis(50)));
        assert_eq!(config.sweep.tick_interval_ms, 50);
        assert_eq!(config.sweep.tick_interval(), Duration::from_millis(50));
    }

    #[test]
    fn parse_empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(!config.cooldown.strict);
        assert_eq!(config.sweep.tick_interval_ms, 50);
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[cooldown]
strict = true
ticks_per_second = 0

[sweep]
tick_interval_ms = 5
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.cooldown.strict);
        assert_eq!(config.cooldown.tick_period(), None);
        assert_eq!(config.sweep.tick_interval(), Duration::from_millis(5));
    }

    #[test]
    fn zero_tick_interval_is_rejected() {
        let mut config = Config::default();
        config.sweep.tick_interval_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CooldownError::Config(_)));
    }

    #[test]
    fn excessive_tick_rate_is_rejected() {
        let mut config = Config::default();
        config.cooldown.ticks_per_second = MAX_TICKS_PER_SECOND + 1;
        assert!(matches!(config.validate(), Err(CooldownError::Config(_))));

        config.cooldown.ticks_per_second = MAX_TICKS_PER_SECOND;
        assert!(config.validate().is_ok());
        assert_eq!(config.cooldown.tick_period(), Some(Duration::from_millis(1)));
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let err = Config::from_toml("[sweep]\ntick_interval_ms = \"fast\"").unwrap_err();
        assert!(matches!(err, CooldownError::ConfigParse(_)));
    }

    #[test]
    fn overrides_replace_parsed_values() {
        let mut config = Config::default();
        config.apply_overrides_from(lookup_from(&[
            ("COOLDOWN_STRICT", "yes"),
            ("COOLDOWN_TICKS_PER_SECOND", "4"),
            ("COOLDOWN_SWEEP_TICK_MS", "10"),
        ]));
        assert!(config.cooldown.strict);
        assert_eq!(config.cooldown.ticks_per_second, 4);
        assert_eq!(config.sweep.tick_interval_ms, 10);
    }

    #[test]
    fn invalid_overrides_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides_from(lookup_from(&[
            ("COOLDOWN_STRICT", "maybe"),
            ("COOLDOWN_TICKS_PER_SECOND", "many"),
            ("COOLDOWN_SWEEP_TICK_MS", "-3"),
        ]));
        assert!(!config.cooldown.strict);
        assert_eq!(config.cooldown.ticks_per_second, 20);
        assert_eq!(config.sweep.tick_interval_ms, 50);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sweep]\ntick_interval_ms = 25").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.sweep.tick_interval_ms, 25);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Config::from_file("/nonexistent/cooldown.toml").unwrap_err();
        assert!(matches!(err, CooldownError::ConfigIo(_)));
    }
}
