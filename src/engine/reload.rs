// src/engine/reload.rs

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::collab::LiveReload;
use crate::context::BuildContext;

/// Signals the live-reload client after a rebuildable task completes.
///
/// Called by the engine, never by tasks. A no-op unless the process is
/// watching and the dev server is up.
#[derive(Clone)]
pub struct ReloadCoordinator {
    build: Arc<BuildContext>,
    client: Arc<dyn LiveReload>,
}

impl ReloadCoordinator {
    pub fn new(build: Arc<BuildContext>, client: Arc<dyn LiveReload>) -> Self {
        Self { build, client }
    }

    pub fn is_active(&self) -> bool {
        self.build.watching() && self.build.server_active()
    }

    /// Record that `task` finished successfully. Returns whether a reload was
    /// signalled.
    pub fn task_completed(&self, task: &str) -> bool {
        if !self.is_active() {
            trace!(task, "reload inactive; skipping notify");
            return false;
        }
        debug!(task, "notifying live reload");
        self.client.notify_reload();
        true
    }
}

impl fmt::Debug for ReloadCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReloadCoordinator")
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl LiveReload for Counter {
        fn notify_reload(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn notifies_only_when_watching_with_server() {
        let build = Arc::new(BuildContext::new());
        let counter = Arc::new(Counter::default());
        let coordinator = ReloadCoordinator::new(build.clone(), counter.clone());

        assert!(!coordinator.task_completed("styles"));

        build.enter_watch();
        assert!(!coordinator.task_completed("styles"));

        build.mark_server_active();
        assert!(coordinator.task_completed("styles"));
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn build_mode_never_notifies() {
        let build = Arc::new(BuildContext::new());
        let counter = Arc::new(Counter::default());
        let coordinator = ReloadCoordinator::new(build.clone(), counter.clone());

        build.enter_build();
        build.mark_server_active();
        assert!(!coordinator.task_completed("html"));
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);
    }
}
