// src/collab/fileset.rs

//! Fileset and output descriptors handed to the asset pipeline.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// A set of input files: glob patterns evaluated relative to `base`, minus
/// anything matching `exclude`.
///
/// Patterns use `/` separators and `*` never crosses a directory boundary, so
/// `*.html` only matches files directly inside `base`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fileset {
    pub base: PathBuf,
    pub patterns: Vec<String>,
    pub exclude: Vec<String>,
}

impl Fileset {
    pub fn new(base: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            patterns: vec![pattern.into()],
            exclude: Vec::new(),
        }
    }

    pub fn with_patterns<I, S>(base: impl Into<PathBuf>, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            base: base.into(),
            patterns: patterns.into_iter().map(Into::into).collect(),
            exclude: Vec::new(),
        }
    }

    pub fn excluding(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    /// Compile the include patterns into one matcher.
    pub fn matcher(&self) -> Result<GlobSet> {
        build_globset(&self.patterns)
    }

    /// True if `rel` (relative to `base`, `/`-separated) belongs to the set.
    pub fn contains(&self, rel: &str) -> Result<bool> {
        Ok(self.matcher()?.is_match(rel) && !build_globset(&self.exclude)?.is_match(rel))
    }

    /// All matching files under `base`, sorted by path.
    ///
    /// A missing base directory is an empty fileset, not an error.
    pub fn collect(&self) -> Result<Vec<PathBuf>> {
        let include = self.matcher()?;
        let exclude = build_globset(&self.exclude)?;
        let mut files: Vec<PathBuf> = list_files(&self.base)?
            .into_iter()
            .filter(|path| {
                relative_slash_path(&self.base, path)
                    .map(|rel| include.is_match(&rel) && !exclude.is_match(&rel))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();
        Ok(files)
    }
}

/// Where matched files are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub dir: PathBuf,
    /// How many of the file's parent directories (counted from the file
    /// upwards) are kept under `dir`. `None` keeps the whole relative path.
    pub depth: Option<usize>,
}

impl OutputTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            depth: None,
        }
    }

    pub fn with_depth(dir: impl Into<PathBuf>, depth: usize) -> Self {
        Self {
            dir: dir.into(),
            depth: Some(depth),
        }
    }

    /// Destination of a file whose path relative to its fileset base is `rel`.
    pub fn place(&self, rel: &Path) -> PathBuf {
        self.dir.join(place_relative(rel, self.depth))
    }
}

/// Trim the parent directories of `rel` down to the last `depth` ones.
pub fn place_relative(rel: &Path, depth: Option<usize>) -> PathBuf {
    let parts: Vec<&std::ffi::OsStr> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();

    let Some(depth) = depth else {
        return parts.iter().collect();
    };

    let Some((file, dirs)) = parts.split_last() else {
        return PathBuf::new();
    };
    let keep_from = dirs.len().saturating_sub(depth);
    let mut out: PathBuf = dirs[keep_from..].iter().collect();
    out.push(file);
    out
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Every regular file under `root`, recursively. Missing `root` yields none.
pub fn list_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !root.is_dir() {
        return Ok(files);
    }

    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries =
            std::fs::read_dir(&dir).with_context(|| format!("reading dir {:?}", dir))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
    }

    Ok(files)
}

/// `path` relative to `base`, with forward slashes.
pub fn relative_slash_path(base: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_one_keeps_the_nearest_parent() {
        let rel = Path::new("icons/social/x.png");
        assert_eq!(place_relative(rel, Some(1)), PathBuf::from("social/x.png"));
    }

    #[test]
    fn depth_zero_flattens() {
        let rel = Path::new("icons/social/x.png");
        assert_eq!(place_relative(rel, Some(0)), PathBuf::from("x.png"));
        let target = OutputTarget::with_depth("dist/img", 0);
        assert_eq!(target.place(rel), PathBuf::from("dist/img/x.png"));
    }

    #[test]
    fn depth_larger_than_path_keeps_everything() {
        let rel = Path::new("a/b.woff");
        assert_eq!(place_relative(rel, Some(5)), PathBuf::from("a/b.woff"));
        assert_eq!(place_relative(rel, None), PathBuf::from("a/b.woff"));
    }

    #[test]
    fn star_does_not_cross_directories() {
        let set = build_globset(&["*.html".to_string()]).unwrap();
        assert!(set.is_match("index.html"));
        assert!(!set.is_match("partials/nav.html"));
    }

    #[test]
    fn brace_alternatives_match_any_extension() {
        let set = build_globset(&["images/**/*.{png,gif,jpg,svg}".to_string()]).unwrap();
        assert!(set.is_match("images/logo.svg"));
        assert!(set.is_match("images/a/b/c.jpg"));
        assert!(!set.is_match("images/readme.md"));
    }

    #[test]
    fn exclude_wins_over_include() {
        let fs = Fileset::new("dist/js", "**/*.js").excluding("lib/**");
        assert!(fs.contains("main.js").unwrap());
        assert!(fs.contains("modules/nav.js").unwrap());
        assert!(!fs.contains("lib/jquery.js").unwrap());
    }

    #[test]
    fn collecting_from_missing_base_is_empty() {
        let fs = Fileset::new("/definitely/not/here", "**/*");
        assert!(fs.collect().unwrap().is_empty());
    }
}
