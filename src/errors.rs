// src/errors.rs

//! Crate-wide error type.
//!
//! Resolution errors (`UnknownTask`, `DuplicateTask`, `CyclicComposition`,
//! `EmptyRequest`) are raised before anything runs. `TaskExecution` and
//! `TaskTimeout` come out of the engine once a plan is executing.

use std::time::Duration;

use thiserror::Error;

use crate::types::TaskName;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Unknown task: {0}")]
    UnknownTask(TaskName),

    #[error("Task already registered: {0}")]
    DuplicateTask(TaskName),

    #[error("Cyclic composition: {}", .path.join(" -> "))]
    CyclicComposition { path: Vec<TaskName> },

    #[error("Composition request resolves to no tasks")]
    EmptyRequest,

    #[error("Task '{task}' failed: {source:#}")]
    TaskExecution {
        task: TaskName,
        #[source]
        source: anyhow::Error,
    },

    #[error("Task '{task}' timed out after {after:?}")]
    TaskTimeout { task: TaskName, after: Duration },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BuildError {
    /// Name of the task this error is attributed to, if any.
    pub fn task(&self) -> Option<&str> {
        match self {
            BuildError::TaskExecution { task, .. } | BuildError::TaskTimeout { task, .. } => {
                Some(task)
            }
            _ => None,
        }
    }

    /// True for errors detected while resolving a request (nothing ran).
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            BuildError::UnknownTask(_)
                | BuildError::DuplicateTask(_)
                | BuildError::CyclicComposition { .. }
                | BuildError::EmptyRequest
        )
    }

    /// Attribute an executor failure to `task`.
    ///
    /// Resolution errors coming back from a nested `start` keep their shape so
    /// callers can still match on them.
    pub(crate) fn from_task_failure(task: &str, err: anyhow::Error) -> Self {
        match err.downcast::<BuildError>() {
            Ok(inner) if inner.is_resolution_error() => inner,
            Ok(inner) => BuildError::TaskExecution {
                task: task.to_string(),
                source: anyhow::Error::new(inner),
            },
            Err(err) => BuildError::TaskExecution {
                task: task.to_string(),
                source: err,
            },
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BuildError>;
