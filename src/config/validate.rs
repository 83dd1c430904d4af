// src/config/validate.rs

use crate::collab::Transform;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{BuildError, Result};

const MAX_DEBOUNCE_MS: u64 = 10_000;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = BuildError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_paths(cfg)?;
    validate_watch(cfg)?;
    validate_engine(cfg)?;
    validate_cache(cfg)?;
    validate_transforms(cfg)?;
    Ok(())
}

fn validate_paths(cfg: &RawConfigFile) -> Result<()> {
    let paths = &cfg.paths;
    let named = [("src", &paths.src), ("dest", &paths.dest), ("tmp", &paths.tmp)];

    for (key, path) in named.iter() {
        if path.as_os_str().is_empty() {
            return Err(BuildError::ConfigError(format!(
                "[paths].{key} must not be empty"
            )));
        }
    }

    for (i, (a_key, a)) in named.iter().enumerate() {
        for (b_key, b) in named.iter().skip(i + 1) {
            if a == b {
                return Err(BuildError::ConfigError(format!(
                    "[paths].{a_key} and [paths].{b_key} must differ (both {:?})",
                    a
                )));
            }
        }
    }

    Ok(())
}

fn validate_watch(cfg: &RawConfigFile) -> Result<()> {
    let ms = cfg.watch.debounce_ms;
    if ms == 0 || ms > MAX_DEBOUNCE_MS {
        return Err(BuildError::ConfigError(format!(
            "[watch].debounce_ms must be within 1..={MAX_DEBOUNCE_MS} (got {ms})"
        )));
    }
    Ok(())
}

fn validate_engine(cfg: &RawConfigFile) -> Result<()> {
    if cfg.engine.task_timeout_secs == Some(0) {
        return Err(BuildError::ConfigError(
            "[engine].task_timeout_secs must be >= 1 (omit it to disable the timeout)"
                .to_string(),
        ));
    }
    Ok(())
}

fn validate_cache(cfg: &RawConfigFile) -> Result<()> {
    if cfg.cache.cache_id.trim().is_empty() {
        return Err(BuildError::ConfigError(
            "[cache].cache_id must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_transforms(cfg: &RawConfigFile) -> Result<()> {
    for (key, cmd) in cfg.transform.iter() {
        if !Transform::KEYS.contains(&key.as_str()) {
            return Err(BuildError::ConfigError(format!(
                "unknown transform '{}' in [transform] (expected one of {:?})",
                key,
                Transform::KEYS
            )));
        }
        if cmd.trim().is_empty() {
            return Err(BuildError::ConfigError(format!(
                "[transform].{key} must not be an empty command"
            )));
        }
    }
    Ok(())
}
