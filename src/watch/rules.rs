// src/watch/rules.rs

use std::fmt;

use anyhow::Result;
use globset::GlobSet;

use crate::collab::fileset::build_globset;
use crate::compose::Request;

/// A file-pattern to task-set binding active during watch mode.
///
/// Patterns are globs relative to the project root with `/` separators,
/// e.g. `app/styles/**/*.{sass,css,scss}`.
#[derive(Debug, Clone)]
pub struct WatchRule {
    label: String,
    patterns: Vec<String>,
    request: Request,
}

impl WatchRule {
    pub fn new<I, S>(label: impl Into<String>, patterns: I, request: impl Into<Request>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: label.into(),
            patterns: patterns.into_iter().map(Into::into).collect(),
            request: request.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn compile(&self) -> Result<CompiledRule> {
        Ok(CompiledRule {
            matcher: build_globset(&self.patterns)?,
            rule: self.clone(),
        })
    }
}

/// A [`WatchRule`] with its patterns compiled.
#[derive(Clone)]
pub struct CompiledRule {
    rule: WatchRule,
    matcher: GlobSet,
}

impl CompiledRule {
    pub fn rule(&self) -> &WatchRule {
        &self.rule
    }

    /// `rel_path` must be relative to the project root, `/`-separated.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }
}

impl fmt::Debug for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRule")
            .field("label", &self.rule.label)
            .field("patterns", &self.rule.patterns)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_rule_matches_any_stylesheet_extension() {
        let rule = WatchRule::new("styles", ["app/styles/**/*.{sass,css,scss}"], "styles")
            .compile()
            .unwrap();
        assert!(rule.matches("app/styles/app.scss"));
        assert!(rule.matches("app/styles/partials/_nav.sass"));
        assert!(!rule.matches("app/styles/readme.md"));
        assert!(!rule.matches("app/scripts/main.css"));
    }

    #[test]
    fn html_rule_only_sees_top_level_documents() {
        let rule = WatchRule::new("html", ["app/*.html"], "html").compile().unwrap();
        assert!(rule.matches("app/index.html"));
        assert!(!rule.matches("app/partials/nav.html"));
    }
}
