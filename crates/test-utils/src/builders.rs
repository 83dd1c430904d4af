#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use assetrun::collab::Collaborators;
use assetrun::compose::Request;
use assetrun::context::BuildContext;
use assetrun::engine::{Engine, EngineOptions, TaskContext};
use assetrun::pipeline::{Layout, default_registry};
use assetrun::registry::{TaskDef, TaskRegistry};

use crate::doubles::{CountingReload, RecordingDevServer, RecordingPipeline};
use crate::journal::Journal;

/// Builder for a `TaskRegistry` of journal-backed fake tasks.
///
/// Every task records its start and finish into the shared [`Journal`].
pub struct RegistryBuilder {
    journal: Journal,
    defs: Vec<TaskDef>,
}

impl RegistryBuilder {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            defs: Vec::new(),
        }
    }

    /// A task that succeeds immediately.
    pub fn ok(self, name: &str) -> Self {
        self.sleeping(name, Duration::ZERO)
    }

    /// A task that succeeds after `delay`.
    pub fn sleeping(self, name: &str, delay: Duration) -> Self {
        let def = journal_task(self.journal.clone(), name, delay, false);
        self.with(def)
    }

    /// A task that fails after `delay`.
    pub fn failing(self, name: &str, delay: Duration) -> Self {
        let def = journal_task(self.journal.clone(), name, delay, true);
        self.with(def)
    }

    /// A successful task marked rebuildable.
    pub fn rebuildable(self, name: &str) -> Self {
        let def = journal_task(self.journal.clone(), name, Duration::ZERO, false).rebuildable();
        self.with(def)
    }

    /// A task that starts `request` from inside its body.
    pub fn starting(self, name: &str, request: Request) -> Self {
        let journal = self.journal.clone();
        let def = TaskDef::leaf(name, move |cx: TaskContext| {
            let journal = journal.clone();
            let request = request.clone();
            async move {
                journal.start(cx.name());
                cx.start(request).await?;
                journal.finish(cx.name());
                Ok(())
            }
        });
        self.with(def)
    }

    pub fn composite(self, name: &str, request: Request) -> Self {
        self.with(TaskDef::composite(name, request))
    }

    pub fn with(mut self, def: TaskDef) -> Self {
        self.defs.push(def);
        self
    }

    pub fn build(self) -> TaskRegistry {
        let mut registry = TaskRegistry::new();
        for def in self.defs {
            registry.register(def).expect("duplicate task in builder");
        }
        registry
    }
}

fn journal_task(journal: Journal, name: &str, delay: Duration, fail: bool) -> TaskDef {
    TaskDef::leaf(name, move |cx: TaskContext| {
        let journal = journal.clone();
        async move {
            journal.start(cx.name());
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            journal.finish(cx.name());
            if fail {
                anyhow::bail!("{} failed", cx.name());
            }
            Ok(())
        }
    })
}

/// An engine wired to recording collaborators.
pub struct Harness {
    pub engine: Engine,
    pub build: Arc<BuildContext>,
    pub pipeline: RecordingPipeline,
    pub reload: CountingReload,
    pub server: RecordingDevServer,
}

/// Builder for [`Harness`].
pub struct HarnessBuilder {
    registry: Option<TaskRegistry>,
    layout: Layout,
    options: EngineOptions,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            registry: None,
            layout: Layout::default(),
            options: EngineOptions::default(),
        }
    }

    pub fn registry(mut self, registry: TaskRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn task_timeout(mut self, timeout: Duration) -> Self {
        self.options.task_timeout = Some(timeout);
        self
    }

    /// Uses the pipeline's own task registry unless one was given.
    pub fn build(self) -> Harness {
        let registry = match self.registry {
            Some(registry) => registry,
            None => default_registry().expect("default registry is valid"),
        };
        let build = Arc::new(BuildContext::new());
        let pipeline = RecordingPipeline::new();
        let reload = CountingReload::new();
        let server = RecordingDevServer::new();

        let collab = Collaborators::new(
            Arc::new(pipeline.clone()),
            Arc::new(reload.clone()),
            Arc::new(server.clone()),
        );
        let engine = Engine::new(registry, build.clone(), collab, self.layout, self.options);

        Harness {
            engine,
            build,
            pipeline,
            reload,
            server,
        }
    }
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self::new()
    }
}
