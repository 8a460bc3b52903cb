// src/logging.rs

//! Logging setup for `devloop` using `tracing` + `tracing-subscriber`.
//!
//! The level comes from `--log-level`, else from the `DEVLOOP_LOG`
//! environment variable, else `info`. Logs go to stderr; stdout carries the
//! tools' output and the stage delimiters.

use anyhow::{Result, anyhow};
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "DEVLOOP_LOG";

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let level = resolve_level(cli_level, env_value.as_deref());

    fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("cannot install log subscriber: {err}"))
}

/// Pick the effective level. Unparseable environment values are ignored.
pub fn resolve_level(cli_level: Option<LogLevel>, env_value: Option<&str>) -> Level {
    cli_level
        .map(Level::from)
        .or_else(|| env_value.and_then(|v| v.trim().parse().ok()))
        .unwrap_or(Level::INFO)
}

impl From<LogLevel> for Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}
