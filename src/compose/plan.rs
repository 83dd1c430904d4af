// src/compose/plan.rs

//! Execution plans produced by the resolver and consumed by the engine.

use std::fmt;
use std::sync::Arc;

use crate::registry::TaskExecutor;
use crate::types::TaskName;

/// How the invocations of a [`Stage`] are run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageMode {
    /// One at a time, in declared order; the first failure stops the stage.
    Sequential,
    /// All started together; the stage ends once every invocation has.
    Parallel,
}

/// A resolved leaf task, ready to run.
#[derive(Clone)]
pub struct LeafInvocation {
    pub name: TaskName,
    pub executor: Arc<dyn TaskExecutor>,
    /// Whether the reload coordinator is told when this task completes.
    pub rebuildable: bool,
}

impl fmt::Debug for LeafInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafInvocation")
            .field("name", &self.name)
            .field("rebuildable", &self.rebuildable)
            .finish_non_exhaustive()
    }
}

/// One unit of work inside a stage.
#[derive(Debug, Clone)]
pub enum Invocation {
    Leaf(LeafInvocation),
    /// A multi-stage sub-plan run as a single concurrent unit of a parallel
    /// stage (e.g. `parallel[[lint, scripts], styles]`).
    Nested(ExecutionPlan),
}

impl Invocation {
    /// Short human-readable label used in logs and errors.
    pub fn label(&self) -> String {
        match self {
            Invocation::Leaf(leaf) => leaf.name.clone(),
            Invocation::Nested(plan) => {
                let parts: Vec<String> = plan.stages.iter().map(Stage::to_string).collect();
                format!("({})", parts.join(" -> "))
            }
        }
    }

    fn collect_leaf_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Invocation::Leaf(leaf) => out.push(leaf.name.as_str()),
            Invocation::Nested(plan) => {
                for stage in &plan.stages {
                    for inv in &stage.invocations {
                        inv.collect_leaf_names(out);
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Stage {
    pub mode: StageMode,
    pub invocations: Vec<Invocation>,
}

impl Stage {
    pub fn sequential(invocations: Vec<Invocation>) -> Self {
        Self {
            mode: StageMode::Sequential,
            invocations,
        }
    }

    pub fn parallel(invocations: Vec<Invocation>) -> Self {
        Self {
            mode: StageMode::Parallel,
            invocations,
        }
    }

    /// Labels of the invocations, in declared order.
    pub fn labels(&self) -> Vec<String> {
        self.invocations.iter().map(Invocation::label).collect()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            StageMode::Sequential => "sequential",
            StageMode::Parallel => "parallel",
        };
        write!(f, "{mode}[{}]", self.labels().join(", "))
    }
}

/// Ordered stages resolved from one composition request.
///
/// Built once per request and consumed by the engine.
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    stages: Vec<Stage>,
}

impl ExecutionPlan {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn into_stages(self) -> Vec<Stage> {
        self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Every leaf task the plan will invoke, in declared order.
    pub fn leaf_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for stage in &self.stages {
            for inv in &stage.invocations {
                inv.collect_leaf_names(&mut out);
            }
        }
        out
    }
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}. {stage}", i + 1)?;
        }
        Ok(())
    }
}
