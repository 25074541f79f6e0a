// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every switch here has an environment counterpart (`BUILD_ONLY`,
//! `BUILD_WATCH`, `BUILD_SERVE`, `WITH_TIMINGS`); a switch given on the
//! command line wins over the environment.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `assetpipe`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "assetpipe",
    version,
    about = "Build, watch and serve front-end style and script artifacts.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the project file (TOML). Optional; defaults apply if missing.
    #[arg(long, value_name = "PATH", default_value = "Assetpipe.toml")]
    pub config: String,

    /// Run only one pipeline (overrides `BUILD_ONLY`).
    #[arg(long, value_enum, value_name = "TARGET")]
    pub only: Option<OnlyTarget>,

    /// Keep running and recompile on changes (overrides `BUILD_WATCH`).
    #[arg(long)]
    pub watch: bool,

    /// Watch plus live-reload notification (overrides `BUILD_SERVE`).
    #[arg(long)]
    pub serve: bool,

    /// Log elapsed time of every pipeline invocation (overrides `WITH_TIMINGS`).
    #[arg(long)]
    pub timings: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve flags and config, print the plan, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Pipeline selector as exposed on the CLI. Values match `BUILD_ONLY`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OnlyTarget {
    Css,
    Javascript,
}

impl OnlyTarget {
    pub fn as_flag(self) -> &'static str {
        match self {
            OnlyTarget::Css => "css",
            OnlyTarget::Javascript => "javascript",
        }
    }
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
