// src/collab/mod.rs

//! External collaborators consumed by leaf tasks.
//!
//! The orchestration core never touches file contents itself. Leaf tasks hand
//! a [`Fileset`] and an [`OutputTarget`] to an [`AssetPipeline`], the engine
//! pokes a [`LiveReload`] client after rebuilds, and `serve` starts a
//! [`DevServer`].
//!
//! - [`FsPipeline`] is the filesystem implementation used by the binary.
//!   Each [`Transform`] either runs a configured shell command or falls back
//!   to a small built-in implementation.
//! - [`BroadcastReload`] / [`LoggingDevServer`] are the in-process reload
//!   fan-out and the dev-server stand-in.
//! - Tests swap in recording doubles from `assetrun-test-utils`.

pub mod builtin;
pub mod command;
pub mod fileset;
pub mod fs_pipeline;
pub mod manifest;
pub mod reload;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::types::BoxFuture;

pub use fileset::{Fileset, OutputTarget};
pub use fs_pipeline::FsPipeline;
pub use reload::{BroadcastReload, LoggingDevServer};

/// A named transform an [`AssetPipeline`] knows how to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transform {
    /// Compile stylesheets and concatenate them into `bundle`.
    Styles { bundle: String },
    /// Compile scripts into the output tree.
    Scripts,
    /// Check scripts without producing output.
    Lint,
    /// Minify HTML documents.
    MinifyHtml,
    /// Minify compiled scripts.
    MinifyScripts,
    /// Content-hash versioning with a rename manifest.
    Revision,
    /// Offline-cache manifest.
    Precache { cache_id: String },
}

impl Transform {
    /// Keys accepted in the `[transform]` config section.
    pub const KEYS: [&'static str; 7] =
        ["styles", "scripts", "lint", "htmlmin", "uglify", "rev", "precache"];

    pub fn key(&self) -> &'static str {
        match self {
            Transform::Styles { .. } => "styles",
            Transform::Scripts => "scripts",
            Transform::Lint => "lint",
            Transform::MinifyHtml => "htmlmin",
            Transform::MinifyScripts => "uglify",
            Transform::Revision => "rev",
            Transform::Precache { .. } => "precache",
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Runs file transforms on behalf of leaf tasks.
///
/// Every operation returns the paths it wrote.
pub trait AssetPipeline: Send + Sync {
    fn transform(
        &self,
        step: Transform,
        input: Fileset,
        output: OutputTarget,
    ) -> BoxFuture<anyhow::Result<Vec<PathBuf>>>;

    fn copy(&self, input: Fileset, output: OutputTarget) -> BoxFuture<anyhow::Result<Vec<PathBuf>>>;

    /// Remove `path` and everything below it. A missing directory is not an
    /// error.
    fn clear_directory(&self, path: PathBuf) -> BoxFuture<anyhow::Result<()>>;
}

/// Live-reload client. Fire-and-forget.
pub trait LiveReload: Send + Sync {
    fn notify_reload(&self);
}

/// Preview server for the output directory.
pub trait DevServer: Send + Sync {
    /// Start serving `root`. Resolves once the server is up; serving itself
    /// continues in the background.
    fn start(&self, root: PathBuf) -> BoxFuture<anyhow::Result<()>>;
}

/// The set of collaborator handles shared by every task invocation.
#[derive(Clone)]
pub struct Collaborators {
    pub pipeline: Arc<dyn AssetPipeline>,
    pub reload: Arc<dyn LiveReload>,
    pub server: Arc<dyn DevServer>,
}

impl Collaborators {
    pub fn new(
        pipeline: Arc<dyn AssetPipeline>,
        reload: Arc<dyn LiveReload>,
        server: Arc<dyn DevServer>,
    ) -> Self {
        Self {
            pipeline,
            reload,
            server,
        }
    }

    /// Filesystem pipeline rooted at `root`, an in-process reload fan-out and
    /// the logging dev server.
    pub fn filesystem(root: impl Into<PathBuf>, commands: BTreeMap<String, String>) -> Self {
        let reload = BroadcastReload::new();
        Self {
            pipeline: Arc::new(FsPipeline::new(root, commands)),
            server: Arc::new(LoggingDevServer::new(reload.clone())),
            reload: Arc::new(reload),
        }
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
