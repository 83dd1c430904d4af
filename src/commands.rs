// src/commands.rs

//! Top-level commands: `build`, `watch` and ad-hoc task runs, plus the
//! dry-run and listing output.

use std::fmt::Write as _;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::compose::Request;
use crate::engine::Engine;
use crate::errors::{BuildError, Result};
use crate::pipeline;
use crate::registry::TaskRegistry;
use crate::types::TaskName;
use crate::watch::{RebuildBackend, spawn_watcher};

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopLevel {
    Build,
    Watch,
    /// Registered tasks, run as one ordered sequence.
    Tasks(Vec<TaskName>),
}

impl TopLevel {
    pub fn from_names(names: &[String]) -> Result<Self> {
        match names {
            [] => Ok(TopLevel::Watch),
            [only] if only == "build" => Ok(TopLevel::Build),
            [only] if only == "watch" => Ok(TopLevel::Watch),
            _ => {
                if let Some(cmd) = names.iter().find(|n| *n == "build" || *n == "watch") {
                    return Err(BuildError::ConfigError(format!(
                        "'{cmd}' is a top-level command and cannot be combined with other tasks"
                    )));
                }
                Ok(TopLevel::Tasks(names.to_vec()))
            }
        }
    }

    fn request(names: &[TaskName]) -> Request {
        match names {
            [only] => Request::task(only.clone()),
            _ => Request::seq(names.iter().cloned()),
        }
    }
}

/// One-shot production build.
pub async fn build(engine: &Engine) -> Result<()> {
    engine.build_context().enter_build();
    engine.run(&pipeline::build_request()).await
}

/// Watch mode.
///
/// Cleans (fatal on failure), runs the initial build (failures logged),
/// starts the dev server, then installs the watch rules and keeps rebuilding
/// until `shutdown` resolves.
pub async fn watch<F>(engine: &Engine, debounce: Duration, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    engine.build_context().enter_watch();

    engine.run(&Request::task("clean")).await?;

    let rules = pipeline::watch_rules(engine.layout());
    if let Err(err) = engine.run(&pipeline::initial_watch_request(&rules)).await {
        warn!(error = %err, "initial build failed; watching anyway");
    }

    engine.run(&Request::task("serve")).await?;

    let backend: Arc<dyn RebuildBackend> = Arc::new(engine.clone());
    let _watcher = spawn_watcher(engine.layout().root.clone(), &rules, debounce, backend)?;
    info!(?debounce, "watching for changes (Ctrl-C to stop)");

    shutdown.await;
    info!("shutting down watch mode");
    Ok(())
}

/// Run registered tasks in order. `production` switches the build context
/// into production mode first.
///
/// If one of the tasks started the dev server, keep serving until `shutdown`
/// resolves.
pub async fn run_tasks<F>(
    engine: &Engine,
    names: &[TaskName],
    production: bool,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    if production {
        engine.build_context().enter_build();
    }
    engine.run(&TopLevel::request(names)).await?;

    if engine.build_context().server_active() {
        info!(root = ?engine.layout().dest, "serving (Ctrl-C to stop)");
        shutdown.await;
        info!("shutting down dev server");
    }
    Ok(())
}

/// Human-readable description of what `top` would do, without running it.
pub fn describe(engine: &Engine, top: &TopLevel) -> Result<String> {
    let mut out = String::new();
    match top {
        TopLevel::Build => {
            let plan = engine.plan(&pipeline::build_request())?;
            let _ = writeln!(out, "build (production):\n{plan}");
        }
        TopLevel::Watch => {
            let rules = pipeline::watch_rules(engine.layout());
            let clean = engine.plan(&Request::task("clean"))?;
            let initial = engine.plan(&pipeline::initial_watch_request(&rules))?;
            let serve = engine.plan(&Request::task("serve"))?;
            let _ = writeln!(out, "watch:\n{clean}\ninitial build:\n{initial}\n{serve}");
            let _ = writeln!(out, "rules:");
            for rule in &rules {
                engine.plan(rule.request())?;
                let _ = writeln!(out, "  {} -> {}", rule.patterns().join(", "), rule.request());
            }
        }
        TopLevel::Tasks(names) => {
            let plan = engine.plan(&TopLevel::request(names))?;
            let _ = writeln!(out, "{plan}");
        }
    }
    Ok(out)
}

/// One line per registered task, plus the top-level commands.
pub fn list_tasks(registry: &TaskRegistry) -> String {
    let width = registry
        .tasks()
        .map(|t| t.name().len())
        .chain(["build".len(), "watch".len()])
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(out, "{:width$}  production build into the output directory", "build");
    let _ = writeln!(out, "{:width$}  clean, build, serve and rebuild on change", "watch");
    for task in registry.tasks() {
        let mut tags = Vec::new();
        if task.is_composite() {
            tags.push("composite");
        }
        if task.is_rebuildable() {
            tags.push("rebuildable");
        }
        let tags = if tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", tags.join(", "))
        };
        let _ = writeln!(out, "{:width$}  {}{}", task.name(), task.description(), tags);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_names_means_watch() {
        assert_eq!(TopLevel::from_names(&[]).unwrap(), TopLevel::Watch);
        assert_eq!(TopLevel::from_names(&names(&["build"])).unwrap(), TopLevel::Build);
    }

    #[test]
    fn top_level_commands_do_not_mix_with_tasks() {
        let err = TopLevel::from_names(&names(&["clean", "build"])).unwrap_err();
        assert!(matches!(err, BuildError::ConfigError(_)));
    }

    #[test]
    fn several_tasks_run_as_a_sequence() {
        assert_eq!(
            TopLevel::request(&names(&["clean", "styles"])).to_string(),
            "[clean, styles]"
        );
        assert_eq!(TopLevel::request(&names(&["styles"])).to_string(), "styles");
    }

    #[test]
    fn listing_marks_rebuildable_tasks() {
        let registry = pipeline::default_registry().unwrap();
        let listing = list_tasks(&registry);
        assert!(listing.lines().any(|l| l.starts_with("styles") && l.ends_with("[rebuildable]")));
        assert!(listing.lines().any(|l| l.starts_with("clean") && !l.contains('[')));
        assert!(listing.starts_with("build"));
    }
}
