// src/pipeline/layout.rs

use std::path::{Path, PathBuf};

use crate::config::{ConfigFile, PathsSection};

/// Absolute project directories, resolved once from `[paths]` against the
/// project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub root: PathBuf,
    pub src: PathBuf,
    pub dest: PathBuf,
    pub tmp: PathBuf,
    pub cache_id: String,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>, paths: &PathsSection, cache_id: impl Into<String>) -> Self {
        let root = root.into();
        Self {
            src: root.join(&paths.src),
            dest: root.join(&paths.dest),
            tmp: root.join(&paths.tmp),
            cache_id: cache_id.into(),
            root,
        }
    }

    pub fn from_config(root: impl Into<PathBuf>, cfg: &ConfigFile) -> Self {
        Self::new(root, cfg.paths(), cfg.cache_id())
    }

    /// `rel` inside the output directory.
    pub fn dest_path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.dest.join(rel)
    }

    /// The source directory relative to the project root, with forward
    /// slashes (used to build watch globs).
    pub fn src_prefix(&self) -> String {
        self.src
            .strip_prefix(&self.root)
            .unwrap_or(&self.src)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::from_config(".", &ConfigFile::default())
    }
}
