// src/watch/mod.rs

//! File watching and debounced rebuilds.
//!
//! This module is responsible for:
//! - Compiling watch rule globs ([`rules`]).
//! - Coalescing bursts of changes per rule and submitting the rule's request
//!   to a [`RebuildBackend`] at most once at a time ([`debounce`]).
//! - Wiring up a cross-platform filesystem watcher (`notify`) that routes
//!   changed paths to the matching rules ([`watcher`]).

pub mod debounce;
pub mod rules;
pub mod watcher;

pub use debounce::{RebuildBackend, RuleMachine, RuleState, RuleTrigger, spawn_rule};
pub use rules::{CompiledRule, WatchRule};
pub use watcher::{Dispatcher, WatcherHandle, spawn_watcher};
