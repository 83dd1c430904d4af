// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `assetrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetrun",
    version,
    about = "Build and watch a front-end asset pipeline.",
    long_about = None
)]
pub struct CliArgs {
    /// Tasks to run. `build` and `watch` are top-level commands; anything
    /// else is a registered task. Several tasks run in the given order.
    #[arg(value_name = "TASK", default_value = "watch")]
    pub tasks: Vec<String>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Assetrun.toml` in the project root, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Project root. Default: the current working directory.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the execution plan, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the registered tasks and exit.
    #[arg(long)]
    pub list: bool,

    /// Run ad-hoc tasks in production mode (minified output).
    #[arg(long)]
    pub production: bool,
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
