// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, trace, warn};

use crate::watch::debounce::{RebuildBackend, RuleTrigger, spawn_rule};
use crate::watch::rules::{CompiledRule, WatchRule};

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping it stops file
/// watching, which in turn stops every rule actor once in-flight rebuilds
/// finish.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Routes changed paths to the rule actors whose patterns match.
#[derive(Debug)]
pub struct Dispatcher {
    root: PathBuf,
    rules: Vec<(CompiledRule, RuleTrigger)>,
}

impl Dispatcher {
    /// Compile `rules` and spawn one debounce actor per rule.
    pub fn new(
        root: impl Into<PathBuf>,
        rules: &[WatchRule],
        window: Duration,
        backend: Arc<dyn RebuildBackend>,
    ) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let trigger = spawn_rule(rule, window, Arc::clone(&backend));
            compiled.push((rule.compile()?, trigger));
        }
        Ok(Self {
            root: root.into(),
            rules: compiled,
        })
    }

    /// Notify every rule matching `path`. Returns how many matched.
    pub fn dispatch(&self, path: &Path) -> usize {
        let Some(rel) = relative_to_root(&self.root, path) else {
            trace!(?path, "change outside project root");
            return 0;
        };

        let mut matched = 0;
        for (rule, trigger) in &self.rules {
            if rule.matches(&rel) {
                trace!(rule = trigger.label(), path = %rel, "routing change");
                trigger.notify(rel.clone());
                matched += 1;
            }
        }
        if matched == 0 {
            trace!(path = %rel, "no watch rule matches");
        }
        matched
    }
}

/// Spawn a filesystem watcher on `root` that feeds matching changes into the
/// per-rule debounce actors.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    rules: &[WatchRule],
    window: Duration,
    backend: Arc<dyn RebuildBackend>,
) -> Result<WatcherHandle> {
    let root = root.into();
    // Canonicalize once so we have a stable base path.
    let root = root.canonicalize().unwrap_or(root);

    let dispatcher = Dispatcher::new(root.clone(), rules, window, backend)?;

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("assetrun: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("assetrun: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!(?root, rules = rules.len(), "file watcher started");

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if matches!(event.kind, EventKind::Access(_)) {
                continue;
            }
            trace!(?event, "received notify event");
            for path in &event.paths {
                dispatcher.dispatch(path);
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// `path` relative to `root` with forward slashes.
///
/// Falls back to comparing canonical paths, since some platforms report
/// events under a different absolute prefix (symlinks, `/private/var`).
fn relative_to_root(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    match (root.canonicalize(), path.canonicalize()) {
        (Ok(root), Ok(path)) => path
            .strip_prefix(&root)
            .ok()
            .map(|rel| rel.to_string_lossy().replace('\\', "/")),
        _ => {
            warn!(?path, "could not relate changed path to project root");
            None
        }
    }
}
