// src/context.rs

//! Process-wide build mode flags.
//!
//! One [`BuildContext`] is created per process and shared (behind an `Arc`)
//! by every task invocation of a top-level command, including nested
//! requests. Tasks only read it. The `build` and `watch` command handlers
//! set the mode once before anything runs, and the `serve` task flips
//! `server_active` when the dev server comes up.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::types::BuildMode;

#[derive(Debug, Default)]
pub struct BuildContext {
    production: AtomicBool,
    watching: AtomicBool,
    server_active: AtomicBool,
}

impl BuildContext {
    /// Fresh context in the pre-invocation state (every flag false).
    pub fn new() -> Self {
        Self::default()
    }

    /// Context already switched into `mode`.
    pub fn for_mode(mode: BuildMode) -> Self {
        let cx = Self::new();
        cx.apply(mode);
        cx
    }

    /// Switch into production mode (`build`).
    pub fn enter_build(&self) {
        self.enter(BuildMode::Build);
    }

    /// Switch into watch mode (`watch`).
    pub fn enter_watch(&self) {
        self.enter(BuildMode::Watch);
    }

    /// Record that the live-reload dev server is up.
    pub fn mark_server_active(&self) {
        debug!("dev server marked active");
        self.server_active.store(true, Ordering::Release);
    }

    pub fn production(&self) -> bool {
        self.production.load(Ordering::Acquire)
    }

    pub fn watching(&self) -> bool {
        self.watching.load(Ordering::Acquire)
    }

    pub fn server_active(&self) -> bool {
        self.server_active.load(Ordering::Acquire)
    }

    /// Current mode derived from the flags.
    pub fn mode(&self) -> BuildMode {
        match (self.production(), self.watching()) {
            (true, _) => BuildMode::Build,
            (false, true) => BuildMode::Watch,
            (false, false) => BuildMode::Idle,
        }
    }

    fn enter(&self, mode: BuildMode) {
        let current = self.mode();
        if current != BuildMode::Idle {
            warn!(%current, requested = %mode, "build mode already set; overriding");
        }
        self.apply(mode);
        debug!(%mode, "build context mode set");
    }

    fn apply(&self, mode: BuildMode) {
        let (production, watching) = match mode {
            BuildMode::Idle => (false, false),
            BuildMode::Build => (true, false),
            BuildMode::Watch => (false, true),
        };
        self.production.store(production, Ordering::Release);
        self.watching.store(watching, Ordering::Release);
    }
}
