// src/compose/resolver.rs

//! Expands composition requests into execution plans.
//!
//! Rules:
//! - A leaf name becomes a single-invocation sequential stage.
//! - A composite name expands inline to the stages of its request.
//! - An ordered list appends the stages of each element in order.
//! - A parallel list merges its elements into one parallel stage. An element
//!   that resolves to more than one stage (or to a multi-invocation
//!   sequential stage) is kept whole as a nested invocation.
//!
//! The set of names on the active resolution path is tracked; reaching a
//! name already on the path is a cycle. All errors are raised before the
//! engine sees the plan, so a malformed request never runs anything.

use tracing::trace;

use crate::compose::plan::{ExecutionPlan, Invocation, LeafInvocation, Stage, StageMode};
use crate::compose::request::Request;
use crate::errors::{BuildError, Result};
use crate::registry::{TaskKind, TaskRegistry};
use crate::types::TaskName;

#[derive(Debug, Clone, Copy)]
pub struct Resolver<'r> {
    registry: &'r TaskRegistry,
}

impl<'r> Resolver<'r> {
    pub fn new(registry: &'r TaskRegistry) -> Self {
        Self { registry }
    }

    /// Resolve a top-level request.
    pub fn resolve(&self, request: &Request) -> Result<ExecutionPlan> {
        self.resolve_within(request, &[])
    }

    /// Resolve a request issued from inside a running task.
    ///
    /// `lineage` is the chain of task names that led to the caller; those
    /// names count as already on the resolution path.
    pub fn resolve_within(&self, request: &Request, lineage: &[TaskName]) -> Result<ExecutionPlan> {
        let mut path: Vec<TaskName> = lineage.to_vec();
        let stages = self.expand(request, &mut path)?;
        if stages.is_empty() {
            return Err(BuildError::EmptyRequest);
        }
        Ok(ExecutionPlan::new(stages))
    }

    fn expand(&self, request: &Request, path: &mut Vec<TaskName>) -> Result<Vec<Stage>> {
        match request {
            Request::Task(name) => self.expand_name(name, path),
            Request::Sequence(items) => {
                let mut stages = Vec::new();
                for item in items {
                    stages.extend(self.expand(item, path)?);
                }
                Ok(stages)
            }
            Request::Parallel(items) => {
                let mut invocations = Vec::new();
                for item in items {
                    let stages = self.expand(item, path)?;
                    invocations.extend(into_invocations(stages));
                }
                if invocations.is_empty() {
                    return Ok(Vec::new());
                }
                Ok(vec![Stage::parallel(invocations)])
            }
        }
    }

    fn expand_name(&self, name: &str, path: &mut Vec<TaskName>) -> Result<Vec<Stage>> {
        if path.iter().any(|p| p == name) {
            let mut cycle = path.clone();
            cycle.push(name.to_string());
            return Err(BuildError::CyclicComposition { path: cycle });
        }

        let def = self.registry.resolve(name)?;
        match def.kind() {
            TaskKind::Leaf(executor) => {
                trace!(task = %name, "resolved leaf");
                Ok(vec![Stage::sequential(vec![Invocation::Leaf(LeafInvocation {
                    name: name.to_string(),
                    executor: executor.clone(),
                    rebuildable: def.is_rebuildable(),
                })])])
            }
            TaskKind::Composite(inner) => {
                trace!(task = %name, request = %inner, "expanding composite");
                path.push(name.to_string());
                let stages = self.expand(inner, path);
                path.pop();
                stages
            }
        }
    }
}

/// Turn the stages of one parallel element into invocations for the
/// enclosing parallel stage.
fn into_invocations(mut stages: Vec<Stage>) -> Vec<Invocation> {
    match stages.len() {
        0 => Vec::new(),
        1 => {
            let stage = stages.remove(0);
            match stage.mode {
                StageMode::Parallel => stage.invocations,
                StageMode::Sequential if stage.invocations.len() == 1 => stage.invocations,
                StageMode::Sequential => {
                    vec![Invocation::Nested(ExecutionPlan::new(vec![stage]))]
                }
            }
        }
        _ => vec![Invocation::Nested(ExecutionPlan::new(stages))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TaskDef;

    fn registry_with(names: &[&str]) -> TaskRegistry {
        let mut registry = TaskRegistry::new();
        for name in names {
            registry
                .register(TaskDef::leaf(*name, |_cx| async { Ok(()) }))
                .unwrap();
        }
        registry
    }

    #[test]
    fn mixed_request_resolves_to_three_stages() {
        let registry = registry_with(&["clean", "fonts", "html", "styles"]);
        let req = Request::seq([
            Request::task("clean"),
            Request::parallel(["fonts", "html"]),
            Request::task("styles"),
        ]);

        let plan = Resolver::new(&registry).resolve(&req).unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(
            plan.to_string(),
            "1. sequential[clean]\n2. parallel[fonts, html]\n3. sequential[styles]"
        );
    }

    #[test]
    fn sequence_inside_parallel_becomes_nested_invocation() {
        let registry = registry_with(&["lint", "scripts", "styles"]);
        let req = Request::parallel([Request::seq(["lint", "scripts"]), Request::task("styles")]);

        let plan = Resolver::new(&registry).resolve(&req).unwrap();
        assert_eq!(plan.len(), 1);
        let stage = &plan.stages()[0];
        assert_eq!(stage.mode, StageMode::Parallel);
        assert!(matches!(stage.invocations[0], Invocation::Nested(_)));
        assert_eq!(
            stage.labels(),
            vec![
                "(sequential[lint] -> sequential[scripts])".to_string(),
                "styles".to_string()
            ]
        );
        assert_eq!(plan.leaf_names(), vec!["lint", "scripts", "styles"]);
    }

    #[test]
    fn nested_parallel_groups_flatten() {
        let registry = registry_with(&["a", "b", "c"]);
        let req = Request::parallel([Request::task("a"), Request::parallel(["b", "c"])]);

        let plan = Resolver::new(&registry).resolve(&req).unwrap();
        assert_eq!(plan.to_string(), "1. parallel[a, b, c]");
    }

    #[test]
    fn composite_expands_like_its_inline_request() {
        let mut registry = registry_with(&["b", "c"]);
        registry
            .register(TaskDef::composite("a", Request::seq(["b", "c"])))
            .unwrap();

        let via_composite = Resolver::new(&registry).resolve(&"a".into()).unwrap();
        let inline = Resolver::new(&registry)
            .resolve(&Request::seq(["b", "c"]))
            .unwrap();
        assert_eq!(via_composite.to_string(), inline.to_string());
    }

    #[test]
    fn self_referencing_composite_is_cyclic() {
        let mut registry = registry_with(&["b"]);
        registry
            .register(TaskDef::composite("a", Request::seq(["b", "a"])))
            .unwrap();

        let err = Resolver::new(&registry).resolve(&"a".into()).unwrap_err();
        match err {
            BuildError::CyclicComposition { path } => assert_eq!(path, vec!["a", "a"]),
            other => panic!("expected CyclicComposition, got {other:?}"),
        }
    }

    #[test]
    fn lineage_counts_as_resolution_path() {
        let registry = registry_with(&["html", "htmlmin"]);
        let resolver = Resolver::new(&registry);
        let lineage = vec!["html".to_string()];

        assert!(resolver.resolve_within(&"htmlmin".into(), &lineage).is_ok());
        let err = resolver.resolve_within(&"html".into(), &lineage).unwrap_err();
        assert!(matches!(err, BuildError::CyclicComposition { .. }));
    }

    #[test]
    fn unknown_name_fails_even_after_valid_elements() {
        let registry = registry_with(&["clean"]);
        let req = Request::seq(["clean", "nope"]);
        let err = Resolver::new(&registry).resolve(&req).unwrap_err();
        assert!(matches!(err, BuildError::UnknownTask(name) if name == "nope"));
    }

    #[test]
    fn empty_request_is_rejected() {
        let registry = registry_with(&[]);
        let err = Resolver::new(&registry)
            .resolve(&Request::Sequence(Vec::new()))
            .unwrap_err();
        assert!(matches!(err, BuildError::EmptyRequest));
    }
}
