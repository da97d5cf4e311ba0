// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `sitedag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitedag",
    version,
    about = "Build a static site through staged Sass/template/lint/minify tasks, with a live-reloading dev server.",
    long_about = None
)]
pub struct CliArgs {
    /// Pipeline (`default`, `build`) or single task to run
    /// (`sass`, `ejs`, `jshint`, `html`, `images`, `concat`, `uglify`,
    /// `cssmin`, `clean:all`, `copy:js`, `copy:dev`, `server`, `watch`).
    #[arg(value_name = "TARGET", default_value = "default")]
    pub target: String,

    /// Path to the config file (TOML).
    ///
    /// Default: `Sitedag.toml` in the working root. A missing default file
    /// means "use built-in defaults"; a missing explicit file is an error.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Working root that all directory roles are relative to.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve config, print directories, stages and watch bindings, but
    /// don't run any task.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
