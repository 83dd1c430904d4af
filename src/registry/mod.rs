// src/registry/mod.rs

//! Task registry: the append-only mapping from task name to definition.
//!
//! Tasks are registered once while the process starts up; the registry is
//! then frozen behind an `Arc` and shared by the resolver and engine.

pub mod task;

use std::collections::BTreeMap;
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::compose::{Request, Resolver};
use crate::errors::{BuildError, Result};
use crate::types::TaskName;

pub use task::{TaskDef, TaskExecutor, TaskFuture, TaskKind};

#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskName, Arc<TaskDef>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task. Names are unique for the lifetime of the registry.
    pub fn register(&mut self, def: TaskDef) -> Result<()> {
        if self.tasks.contains_key(def.name()) {
            return Err(BuildError::DuplicateTask(def.name().to_string()));
        }
        debug!(task = %def.name(), composite = def.is_composite(), "registered task");
        self.tasks.insert(def.name().to_string(), Arc::new(def));
        Ok(())
    }

    /// Look up a task by name.
    pub fn resolve(&self, name: &str) -> Result<Arc<TaskDef>> {
        self.tasks
            .get(name)
            .cloned()
            .ok_or_else(|| BuildError::UnknownTask(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// All registered tasks, ordered by name.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskDef> {
        self.tasks.values().map(|t| t.as_ref())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Validate every composite task up front.
    ///
    /// Fails with `UnknownTask` if a composite references an unregistered
    /// name and with `CyclicComposition` if composites reference each other in
    /// a loop. Dynamic requests issued by leaf executors are still checked at
    /// resolution time.
    pub fn check_compositions(&self) -> Result<()> {
        // Edge direction: composite -> referenced task.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for def in self.tasks.values() {
            graph.add_node(def.name());
            if let TaskKind::Composite(request) = def.kind() {
                for referenced in request.task_names() {
                    if !self.contains(referenced) {
                        return Err(BuildError::UnknownTask(referenced.to_string()));
                    }
                    graph.add_edge(def.name(), referenced, ());
                }
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => {
                let node = cycle.node_id();
                // Resolving the offending composite yields the exact path.
                match Resolver::new(self).resolve(&Request::task(node)) {
                    Err(err @ BuildError::CyclicComposition { .. }) => Err(err),
                    _ => Err(BuildError::CyclicComposition {
                        path: vec![node.to_string(), node.to_string()],
                    }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> TaskDef {
        TaskDef::leaf("noop", |_cx| async { Ok(()) })
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = TaskRegistry::new();
        registry.register(noop()).unwrap();
        let err = registry.register(noop()).unwrap_err();
        assert!(matches!(err, BuildError::DuplicateTask(name) if name == "noop"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn resolving_unknown_name_fails() {
        let registry = TaskRegistry::new();
        let err = registry.resolve("missing").unwrap_err();
        assert!(matches!(err, BuildError::UnknownTask(name) if name == "missing"));
    }

    #[test]
    fn composite_cycle_is_reported_with_its_path() {
        let mut registry = TaskRegistry::new();
        registry.register(noop()).unwrap();
        registry
            .register(TaskDef::composite("a", Request::seq(["noop", "b"])))
            .unwrap();
        registry
            .register(TaskDef::composite("b", Request::parallel(["a"])))
            .unwrap();

        match registry.check_compositions() {
            Err(BuildError::CyclicComposition { path }) => {
                assert_eq!(path.first(), path.last());
                assert!(path.contains(&"a".to_string()));
                assert!(path.contains(&"b".to_string()));
            }
            other => panic!("expected CyclicComposition, got {other:?}"),
        }
    }

    #[test]
    fn composite_with_unknown_reference_fails_check() {
        let mut registry = TaskRegistry::new();
        registry
            .register(TaskDef::composite("all", Request::seq(["ghost"])))
            .unwrap();
        let err = registry.check_compositions().unwrap_err();
        assert!(matches!(err, BuildError::UnknownTask(name) if name == "ghost"));
    }
}
