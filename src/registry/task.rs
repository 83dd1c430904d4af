// src/registry/task.rs

//! Task definitions.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::compose::Request;
use crate::engine::TaskContext;
use crate::types::TaskName;

/// Future returned by a leaf task executor.
pub type TaskFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

/// Trait abstracting the body of a leaf task.
///
/// Executors receive an owned [`TaskContext`] (cheap to clone) giving them the
/// build flags, the asset pipeline and the ability to request further tasks.
/// Any `Fn(TaskContext) -> impl Future<Output = anyhow::Result<()>>` closure
/// is an executor.
pub trait TaskExecutor: Send + Sync {
    fn execute(&self, cx: TaskContext) -> TaskFuture;
}

impl<F, Fut> TaskExecutor for F
where
    F: Fn(TaskContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn execute(&self, cx: TaskContext) -> TaskFuture {
        Box::pin(self(cx))
    }
}

/// What a task does when invoked.
#[derive(Clone)]
pub enum TaskKind {
    /// Performs work directly.
    Leaf(Arc<dyn TaskExecutor>),
    /// Expands to a fixed composition request at resolution time.
    Composite(Request),
}

/// A named, registered unit of build work.
#[derive(Clone)]
pub struct TaskDef {
    name: TaskName,
    description: String,
    kind: TaskKind,
    rebuildable: bool,
}

impl TaskDef {
    /// Leaf task backed by an async closure.
    pub fn leaf<F, Fut>(name: impl Into<TaskName>, body: F) -> Self
    where
        F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::with_executor(name, Arc::new(body))
    }

    /// Leaf task backed by an existing executor.
    pub fn with_executor(name: impl Into<TaskName>, executor: Arc<dyn TaskExecutor>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind: TaskKind::Leaf(executor),
            rebuildable: false,
        }
    }

    pub fn composite(name: impl Into<TaskName>, request: impl Into<Request>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind: TaskKind::Composite(request.into()),
            rebuildable: false,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark the task as producing user-visible output worth a browser reload.
    ///
    /// Only meaningful for leaf tasks.
    pub fn rebuildable(mut self) -> Self {
        self.rebuildable = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    pub fn is_rebuildable(&self) -> bool {
        self.rebuildable
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, TaskKind::Composite(_))
    }
}

impl fmt::Debug for TaskDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("TaskDef");
        d.field("name", &self.name);
        match &self.kind {
            TaskKind::Leaf(_) => d.field("kind", &"leaf"),
            TaskKind::Composite(req) => d.field("kind", req),
        };
        d.field("rebuildable", &self.rebuildable).finish()
    }
}
