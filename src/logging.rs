// src/logging.rs

//! `tracing` subscriber setup.
//!
//! The filter comes from `--log-level` when given; otherwise `SITEDAG_LOG`
//! is read as an `EnvFilter` directive string (`debug`,
//! `sitedag::server=trace,info`, ...), falling back to `info`.
//!
//! Task reports (lint findings, transformation errors, completion lines) all
//! go through this channel; they are told apart by level and fields, not by
//! separate outputs.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable consulted when no `--log-level` is given.
pub const LOG_ENV_VAR: &str = "SITEDAG_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(directive_for(level)),
        None => filter_from_env(std::env::var(LOG_ENV_VAR).ok().as_deref()),
    };

    // Module targets only help when digging into a specific layer.
    let verbose = matches!(cli_level, Some(LogLevel::Debug | LogLevel::Trace));

    fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing log subscriber: {e}"))
}

fn directive_for(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

/// Filter for the value of `SITEDAG_LOG`; unset, blank or unparsable values
/// fall back to `info`.
pub fn filter_from_env(value: Option<&str>) -> EnvFilter {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}
