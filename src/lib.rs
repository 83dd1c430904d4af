// src/lib.rs

pub mod cli;
pub mod collab;
pub mod commands;
pub mod compose;
pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod pipeline;
pub mod registry;
pub mod types;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, error};

use crate::cli::CliArgs;
use crate::collab::Collaborators;
use crate::commands::TopLevel;
use crate::config::load_for_root;
use crate::context::BuildContext;
use crate::engine::{Engine, EngineOptions};
use crate::pipeline::Layout;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - task registry and collaborators
/// - the engine
/// - dispatch to `build`, `watch` or an ad-hoc task run
/// - Ctrl-C handling for watch mode
pub async fn run(args: CliArgs) -> Result<()> {
    let root = match args.root {
        Some(ref root) => root.clone(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    let cfg = load_for_root(&root, args.config.as_deref())?;
    debug!(?root, ?cfg, "configuration loaded");

    let registry = pipeline::default_registry()?;
    if args.list {
        print!("{}", commands::list_tasks(&registry));
        return Ok(());
    }

    let top = TopLevel::from_names(&args.tasks)?;

    let engine = Engine::new(
        registry,
        Arc::new(BuildContext::new()),
        Collaborators::filesystem(&root, cfg.transform_commands().clone()),
        Layout::from_config(&root, &cfg),
        EngineOptions {
            task_timeout: cfg.task_timeout(),
        },
    );

    if args.dry_run {
        print!("{}", commands::describe(&engine, &top)?);
        debug!("dry-run complete (no execution)");
        return Ok(());
    }

    match top {
        TopLevel::Build => commands::build(&engine).await?,
        TopLevel::Watch => commands::watch(&engine, cfg.debounce(), shutdown_signal()).await?,
        TopLevel::Tasks(names) => {
            commands::run_tasks(&engine, &names, args.production, shutdown_signal()).await?
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for Ctrl+C: {e}");
    }
}
