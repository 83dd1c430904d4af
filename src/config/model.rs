// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from `Assetrun.toml`.
///
/// ```toml
/// [paths]
/// src = "app"
/// dest = "dist"
/// tmp = ".tmp"
///
/// [watch]
/// debounce_ms = 200
///
/// [engine]
/// task_timeout_secs = 120
///
/// [cache]
/// cache_id = "my-app"
///
/// [transform]
/// styles = "sass app/styles/app.scss \"$ASSETRUN_OUTPUT/main.css\""
/// ```
///
/// Every section is optional; an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub engine: EngineSection,

    #[serde(default)]
    pub cache: CacheSection,

    /// External commands keyed by transform name (`styles`, `uglify`, ...).
    #[serde(default)]
    pub transform: BTreeMap<String, String>,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`) or
/// [`ConfigFile::default`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    paths: PathsSection,
    watch: WatchSection,
    engine: EngineSection,
    cache: CacheSection,
    transform: BTreeMap<String, String>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            paths: raw.paths,
            watch: raw.watch,
            engine: raw.engine,
            cache: raw.cache,
            transform: raw.transform,
        }
    }

    pub fn paths(&self) -> &PathsSection {
        &self.paths
    }

    pub fn cache_id(&self) -> &str {
        &self.cache.cache_id
    }

    pub fn transform_commands(&self) -> &BTreeMap<String, String> {
        &self.transform
    }

    /// Debounce window for watch rules.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.watch.debounce_ms)
    }

    /// Optional per-invocation timeout guard.
    pub fn task_timeout(&self) -> Option<Duration> {
        self.engine.task_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(RawConfigFile::default())
    }
}

/// `[paths]` section. Relative paths are resolved against the project root.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsSection {
    /// Source tree.
    #[serde(default = "default_src")]
    pub src: PathBuf,

    /// Final output directory.
    #[serde(default = "default_dest")]
    pub dest: PathBuf,

    /// Intermediate directory, cleared on every run.
    #[serde(default = "default_tmp")]
    pub tmp: PathBuf,
}

fn default_src() -> PathBuf {
    PathBuf::from("app")
}

fn default_dest() -> PathBuf {
    PathBuf::from("dist")
}

fn default_tmp() -> PathBuf {
    PathBuf::from(".tmp")
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            src: default_src(),
            dest: default_dest(),
            tmp: default_tmp(),
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Coalescing window for repeated file events on the same rule.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    200
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// `[engine]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    /// Fail a leaf invocation that runs longer than this.
    #[serde(default)]
    pub task_timeout_secs: Option<u64>,
}

/// `[cache]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSection {
    /// Identifier written into the offline-cache manifest.
    #[serde(default = "default_cache_id")]
    pub cache_id: String,
}

fn default_cache_id() -> String {
    "assetrun".to_string()
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            cache_id: default_cache_id(),
        }
    }
}
