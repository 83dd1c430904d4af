// src/compose/mod.rs

//! Composition requests and their resolution into execution plans.
//!
//! - [`request`] is the user-facing shape: a task name, an ordered list, or a
//!   parallel list, nested arbitrarily.
//! - [`plan`] is the flat, immutable result: ordered stages of invocations.
//! - [`resolver`] turns the former into the latter against a registry.

pub mod plan;
pub mod request;
pub mod resolver;

pub use plan::{ExecutionPlan, Invocation, LeafInvocation, Stage, StageMode};
pub use request::Request;
pub use resolver::Resolver;
