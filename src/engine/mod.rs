// src/engine/mod.rs

//! Execution engine.
//!
//! - [`runtime`] owns the [`Engine`]: it resolves requests against the
//!   registry and walks the resulting plan, running sequential stages in
//!   order and parallel stages on a `JoinSet` with a join barrier.
//! - [`context`] is the [`TaskContext`] each leaf invocation receives.
//! - [`reload`] is the [`ReloadCoordinator`] the engine calls after a
//!   rebuildable task succeeds.

pub mod context;
pub mod reload;
pub mod runtime;

pub use context::TaskContext;
pub use reload::ReloadCoordinator;
pub use runtime::{Engine, EngineOptions};
