// src/engine/context.rs

use std::fmt;

use tracing::debug;

use crate::collab::{AssetPipeline, DevServer};
use crate::compose::{Request, Resolver};
use crate::context::BuildContext;
use crate::errors::Result;
use crate::pipeline::Layout;
use crate::types::TaskName;

use super::Engine;

/// Handle given to a leaf task for the duration of one invocation.
///
/// Carries the task's lineage (the chain of task names that led to it) so
/// that sub-requests issued through [`TaskContext::start`] cannot loop back
/// into a task that is already running.
#[derive(Clone)]
pub struct TaskContext {
    engine: Engine,
    name: TaskName,
    lineage: Vec<TaskName>,
}

impl TaskContext {
    pub(crate) fn new(engine: Engine, name: TaskName, lineage: Vec<TaskName>) -> Self {
        Self {
            engine,
            name,
            lineage,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names from the outermost requested task down to this one.
    pub fn lineage(&self) -> &[TaskName] {
        &self.lineage
    }

    pub fn build(&self) -> &BuildContext {
        self.engine.build_context()
    }

    pub fn pipeline(&self) -> &dyn AssetPipeline {
        self.engine.collaborators().pipeline.as_ref()
    }

    pub fn server(&self) -> &dyn DevServer {
        self.engine.collaborators().server.as_ref()
    }

    pub fn layout(&self) -> &Layout {
        self.engine.layout()
    }

    /// Resolve and run a further request with the same build context.
    ///
    /// Resolution sees this task's lineage, so requesting any task already on
    /// it fails with `CyclicComposition` before anything runs.
    pub async fn start(&self, request: impl Into<Request>) -> Result<()> {
        let request = request.into();
        let plan = Resolver::new(self.engine.registry()).resolve_within(&request, &self.lineage)?;
        debug!(task = %self.name, %request, stages = plan.len(), "starting sub-request");
        self.engine.execute_plan(plan, self.lineage.clone()).await
    }
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("name", &self.name)
            .field("lineage", &self.lineage)
            .finish_non_exhaustive()
    }
}

