//! cooldown-demo: exercises timer-driven and sweep-driven cooldowns.
//!
//! Starts one cooldown per expiry strategy, pauses and resumes the timer
//! one, lets both run out, then closes the sweep processor and prints its
//! metrics as JSON.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use cooldown::{Config, Cooldown, CooldownHandler, EventContext, StopCause, SweepProcessor};

// ── CLI ─────────────────────────────────────────────────────────────

/// Run a short cooldown walkthrough and report sweep metrics.
#[derive(Parser, Debug)]
#[command(name = "cooldown-demo", version, about)]
struct Cli {
    /// Path to a cooldown.toml config file.
    #[arg(long, env = "COOLDOWN_CONFIG", default_value = "config/cooldown.toml")]
    config: String,

    /// Cooldown duration in milliseconds.
    #[arg(long, env = "COOLDOWN_DEMO_DURATION_MS", default_value_t = 500)]
    duration_ms: u64,

    /// How long the timer cooldown stays paused, in milliseconds.
    #[arg(long, default_value_t = 200)]
    pause_ms: u64,
}

// ── Handler ─────────────────────────────────────────────────────────

/// Logs every transition with the name of the cooldown it belongs to.
struct LogHandler {
    name: &'static str,
}

impl CooldownHandler<String> for LogHandler {
    fn handle_start(&self, ctx: &mut EventContext<'_, String>, duration: Duration) {
        info!(cooldown = self.name, reason = %ctx.payload(), ?duration, "start");
    }

    fn handle_tick(&self, tick: u64, _payload: &String) {
        debug!(cooldown = self.name, tick, "tick");
    }

    fn handle_pause(&self, ctx: &mut EventContext<'_, String>) {
        info!(cooldown = self.name, remaining = ?ctx.state().remaining(), "pause");
    }

    fn handle_resume(&self, ctx: &mut EventContext<'_, String>) {
        info!(cooldown = self.name, remaining = ?ctx.state().remaining(), "resume");
    }

    fn handle_stop(&self, cause: StopCause, payload: &String) {
        info!(cooldown = self.name, %cause, reason = %payload, "stop");
    }
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    if Path::new(path).exists() {
        return Ok(Config::from_file(path)?);
    }
    warn!(path, "config file not found, using defaults and environment");
    Ok(Config::from_env()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cooldown::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let duration = Duration::from_millis(cli.duration_ms);
    info!(
        strict = config.cooldown.strict,
        ticks_per_second = config.cooldown.ticks_per_second,
        tick_ms = config.sweep.tick_interval_ms,
        ?duration,
        "cooldown demo starting"
    );

    let processor = Arc::new(SweepProcessor::new());
    let tracking = processor.spawn_tracking(config.sweep.tick_interval());

    let timed = Cooldown::<String>::builder()
        .handler(LogHandler { name: "timer" })
        .config(&config.cooldown)
        .build()?;
    let polled = Cooldown::<String>::builder()
        .handler(LogHandler { name: "sweep" })
        .config(&config.cooldown)
        .sweep(Arc::clone(&processor))
        .build()?;

    timed.start(duration, "demo".to_string());
    polled.start(duration, "demo".to_string());

    tokio::time::sleep(duration / 4).await;
    timed.pause(String::new());
    tokio::time::sleep(Duration::from_millis(cli.pause_ms)).await;
    timed.resume(String::new());

    while timed.active() || polled.active() {
        tokio::time::sleep(config.sweep.tick_interval()).await;
    }

    processor.close();
    tracking.await??;

    println!("{}", serde_json::to_string_pretty(&processor.metrics())?);
    Ok(())
}
