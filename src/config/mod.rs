// src/config/mod.rs

//! Configuration loading and validation for assetrun.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate paths, timings and transform commands (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{DEFAULT_CONFIG_FILE, load_and_validate, load_for_root, load_from_path};
pub use model::{
    CacheSection, ConfigFile, EngineSection, PathsSection, RawConfigFile, WatchSection,
};
