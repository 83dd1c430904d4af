// src/types.rs

use std::fmt;

/// Canonical task name type used throughout the crate.
pub type TaskName = String;

/// Which top-level command owns the current process.
///
/// `Idle` is the state before any command has run; `build` and `watch` each
/// move the [`BuildContext`](crate::context::BuildContext) out of it exactly
/// once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    #[default]
    Idle,
    Build,
    Watch,
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildMode::Idle => "idle",
            BuildMode::Build => "build",
            BuildMode::Watch => "watch",
        };
        f.write_str(s)
    }
}

/// Boxed, owned future used at the crate's async trait seams.
pub type BoxFuture<T> = std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'static>>;
