// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::collab::Collaborators;
use crate::compose::{ExecutionPlan, Invocation, LeafInvocation, Request, Resolver, StageMode};
use crate::context::BuildContext;
use crate::errors::{BuildError, Result};
use crate::pipeline::Layout;
use crate::registry::TaskRegistry;
use crate::types::{BoxFuture, TaskName};

use super::{ReloadCoordinator, TaskContext};

/// Engine options, fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOptions {
    /// Fail any single leaf invocation that runs longer than this.
    pub task_timeout: Option<Duration>,
}

/// Resolves composition requests and runs the resulting plans.
///
/// Cheap to clone; every clone shares the same registry, build context and
/// collaborators. Task contexts and nested requests hold a clone.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    registry: TaskRegistry,
    build: Arc<BuildContext>,
    collab: Collaborators,
    reload: ReloadCoordinator,
    layout: Layout,
    options: EngineOptions,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("tasks", &self.inner.registry.len())
            .field("mode", &self.inner.build.mode())
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(
        registry: TaskRegistry,
        build: Arc<BuildContext>,
        collab: Collaborators,
        layout: Layout,
        options: EngineOptions,
    ) -> Self {
        let reload = ReloadCoordinator::new(build.clone(), collab.reload.clone());
        Self {
            inner: Arc::new(EngineInner {
                registry,
                build,
                collab,
                reload,
                layout,
                options,
            }),
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.inner.registry
    }

    pub fn build_context(&self) -> &BuildContext {
        &self.inner.build
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.inner.collab
    }

    pub fn layout(&self) -> &Layout {
        &self.inner.layout
    }

    /// Resolve `request` without running anything.
    pub fn plan(&self, request: &Request) -> Result<ExecutionPlan> {
        Resolver::new(&self.inner.registry).resolve(request)
    }

    /// Resolve and execute `request`.
    ///
    /// Resolution errors are returned before any task starts.
    pub async fn run(&self, request: &Request) -> Result<()> {
        let plan = self.plan(request)?;
        info!(%request, stages = plan.len(), "running request");
        debug!("execution plan:\n{plan}");

        let started = Instant::now();
        let result = self.execute_plan(plan, Vec::new()).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(()) => info!(%request, elapsed_ms, "request finished"),
            Err(err) => error!(%request, elapsed_ms, error = %err, "request failed"),
        }
        result
    }

    /// Run `plan` stage by stage. `lineage` is the chain of tasks that issued
    /// it (empty for top-level requests).
    pub(crate) fn execute_plan(
        &self,
        plan: ExecutionPlan,
        lineage: Vec<TaskName>,
    ) -> BoxFuture<Result<()>> {
        let engine = self.clone();
        Box::pin(async move {
            for (idx, stage) in plan.into_stages().into_iter().enumerate() {
                debug!(stage = idx + 1, "{stage}");
                match stage.mode {
                    StageMode::Sequential => {
                        for invocation in stage.invocations {
                            engine.run_invocation(invocation, lineage.clone()).await?;
                        }
                    }
                    StageMode::Parallel => {
                        engine.run_parallel(stage.invocations, &lineage).await?;
                    }
                }
            }
            Ok(())
        })
    }

    async fn run_invocation(&self, invocation: Invocation, lineage: Vec<TaskName>) -> Result<()> {
        match invocation {
            Invocation::Leaf(leaf) => self.run_leaf(leaf, lineage).await,
            Invocation::Nested(plan) => self.execute_plan(plan, lineage).await,
        }
    }

    /// Start every invocation, wait for all of them, then report the first
    /// failure in declared order. Later failures are only logged.
    async fn run_parallel(&self, invocations: Vec<Invocation>, lineage: &[TaskName]) -> Result<()> {
        let labels: Vec<String> = invocations.iter().map(Invocation::label).collect();
        debug!(?labels, "starting parallel stage");

        let mut set = JoinSet::new();
        for (idx, invocation) in invocations.into_iter().enumerate() {
            let engine = self.clone();
            let lineage = lineage.to_vec();
            set.spawn(async move { (idx, engine.run_invocation(invocation, lineage).await) });
        }

        let mut results: Vec<Option<Result<()>>> = labels.iter().map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, result)) => results[idx] = Some(result),
                Err(join_err) => error!(error = %join_err, "parallel invocation panicked"),
            }
        }

        let mut first: Option<BuildError> = None;
        for (label, result) in labels.into_iter().zip(results) {
            let err = match result {
                Some(Ok(())) => continue,
                Some(Err(err)) => err,
                None => BuildError::TaskExecution {
                    task: label.clone(),
                    source: anyhow::anyhow!("invocation panicked"),
                },
            };
            if first.is_none() {
                first = Some(err);
            } else {
                warn!(task = %label, error = %err, "additional failure in parallel stage");
            }
        }

        match first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn run_leaf(&self, leaf: LeafInvocation, mut lineage: Vec<TaskName>) -> Result<()> {
        let LeafInvocation {
            name,
            executor,
            rebuildable,
        } = leaf;

        lineage.push(name.clone());
        let cx = TaskContext::new(self.clone(), name.clone(), lineage);

        info!(task = %name, "task started");
        let started = Instant::now();
        let fut = executor.execute(cx);

        let outcome = match self.inner.options.task_timeout {
            Some(after) => match tokio::time::timeout(after, fut).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    error!(task = %name, ?after, "task timed out");
                    return Err(BuildError::TaskTimeout { task: name, after });
                }
            },
            None => fut.await,
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok(()) => {
                info!(task = %name, elapsed_ms, "task finished");
                if rebuildable {
                    self.inner.reload.task_completed(&name);
                }
                Ok(())
            }
            Err(err) => {
                let err = BuildError::from_task_failure(&name, err);
                error!(task = %name, elapsed_ms, error = %err, "task failed");
                Err(err)
            }
        }
    }
}
