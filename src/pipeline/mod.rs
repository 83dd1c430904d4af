// src/pipeline/mod.rs

//! The concrete front-end asset pipeline: project layout, filesets, leaf
//! tasks and the `build` / `watch` compositions built from them.

pub mod filesets;
pub mod layout;
pub mod tasks;

use crate::compose::Request;
use crate::watch::WatchRule;

pub use layout::Layout;
pub use tasks::{default_registry, register_defaults};

/// Tasks that are not triggered by a watch rule but belong in the initial
/// watch-mode build.
pub const WATCH_EXTRAS: [&str; 2] = ["extras", "vendor"];

/// Full production build: clean, then every independent category in
/// parallel, then the steps that read the combined output.
pub fn build_request() -> Request {
    Request::seq([
        Request::task("clean"),
        Request::parallel(["lint", "images", "fonts", "styles", "html", "extras", "vendor"]),
        Request::task("scripts"),
        Request::task("rev"),
        Request::task("cache"),
    ])
}

/// File-pattern to task bindings installed by `watch`. Globs are relative to
/// the project root.
pub fn watch_rules(layout: &Layout) -> Vec<WatchRule> {
    let src = layout.src_prefix();
    let under_src = |glob: &str| format!("{src}/{glob}");

    vec![
        WatchRule::new(
            "scripts",
            [under_src(filesets::SCRIPT_GLOB)],
            Request::seq(["lint", "scripts"]),
        ),
        WatchRule::new("styles", [under_src("styles/**/*.{sass,css,scss}")], "styles"),
        WatchRule::new("images", [under_src(filesets::IMAGE_GLOB)], "images"),
        WatchRule::new("fonts", [under_src(filesets::FONT_GLOB)], "fonts"),
        WatchRule::new("html", [under_src(filesets::HTML_GLOB)], "html"),
    ]
}

/// Initial build for watch mode: every rule's request plus the extras, all
/// in parallel.
pub fn initial_watch_request(rules: &[WatchRule]) -> Request {
    let mut items: Vec<Request> = rules.iter().map(|r| r.request().clone()).collect();
    items.extend(WATCH_EXTRAS.iter().map(|name| Request::task(*name)));
    Request::parallel(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_request_renders_in_declared_order() {
        assert_eq!(
            build_request().to_string(),
            "[clean, parallel[lint, images, fonts, styles, html, extras, vendor], scripts, rev, cache]"
        );
    }

    #[test]
    fn watch_rules_are_rooted_at_the_source_dir() {
        let rules = watch_rules(&Layout::default());
        let scripts = rules[0].compile().unwrap();
        assert!(scripts.matches("app/scripts/main.js"));
        assert!(!scripts.matches("dist/js/main.js"));

        let html = rules[4].compile().unwrap();
        assert!(html.matches("app/index.html"));
    }

    #[test]
    fn initial_watch_request_covers_rules_and_extras() {
        let rules = watch_rules(&Layout::default());
        let request = initial_watch_request(&rules);
        assert_eq!(
            request.to_string(),
            "parallel[[lint, scripts], styles, images, fonts, html, extras, vendor]"
        );
    }
}
