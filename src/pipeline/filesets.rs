// src/pipeline/filesets.rs

//! Input filesets and output targets for each asset category.

use crate::collab::{Fileset, OutputTarget};
use crate::pipeline::Layout;

pub const IMAGE_GLOB: &str = "images/**/*.{png,gif,jpg,svg}";
pub const FONT_GLOB: &str = "fonts/**/*.{eot,woff,ttf,svg}";
pub const EXTRAS_GLOB: &str = "*.{txt,json,webapp,ico}";
pub const HTML_GLOB: &str = "*.html";
pub const SCRIPT_GLOB: &str = "scripts/**/*";
pub const LINT_GLOB: &str = "scripts/**/*.js";
pub const VENDOR_GLOB: &str = "vendor/**/*.js";
pub const STYLE_ENTRY: &str = "styles/app.scss";
pub const STYLE_BUNDLE: &str = "main.css";

/// Images keep their nearest parent directory: `images/icons/social/x.png`
/// lands at `img/social/x.png`.
pub fn images(layout: &Layout) -> (Fileset, OutputTarget) {
    (
        Fileset::new(&layout.src, IMAGE_GLOB),
        OutputTarget::with_depth(layout.dest_path("img"), 1),
    )
}

pub fn fonts(layout: &Layout) -> (Fileset, OutputTarget) {
    (
        Fileset::new(&layout.src, FONT_GLOB),
        OutputTarget::with_depth(layout.dest_path("fonts"), 0),
    )
}

pub fn extras(layout: &Layout) -> (Fileset, OutputTarget) {
    (
        Fileset::new(&layout.src, EXTRAS_GLOB),
        OutputTarget::new(&layout.dest),
    )
}

pub fn html(layout: &Layout) -> (Fileset, OutputTarget) {
    (
        Fileset::new(&layout.src, HTML_GLOB),
        OutputTarget::new(&layout.dest),
    )
}

/// Compiled HTML, minified where it sits.
pub fn html_output(layout: &Layout) -> (Fileset, OutputTarget) {
    (
        Fileset::new(&layout.dest, HTML_GLOB),
        OutputTarget::new(&layout.dest),
    )
}

/// Scripts keep their layout below `scripts/`.
pub fn scripts(layout: &Layout) -> (Fileset, OutputTarget) {
    let base = layout.src.join("scripts");
    (
        Fileset::new(base, "**/*"),
        OutputTarget::new(layout.dest_path("js")),
    )
}

/// Compiled application scripts (vendor libraries under `js/lib` excluded).
pub fn script_output(layout: &Layout) -> (Fileset, OutputTarget) {
    let dir = layout.dest_path("js");
    (
        Fileset::new(&dir, "**/*.js").excluding("lib/**"),
        OutputTarget::new(dir),
    )
}

pub fn lint(layout: &Layout) -> (Fileset, OutputTarget) {
    (
        Fileset::new(&layout.src, LINT_GLOB),
        OutputTarget::new(&layout.tmp),
    )
}

pub fn vendor(layout: &Layout) -> (Fileset, OutputTarget) {
    (
        Fileset::new(&layout.src, VENDOR_GLOB),
        OutputTarget::with_depth(layout.dest_path("js/lib"), 0),
    )
}

pub fn styles(layout: &Layout) -> (Fileset, OutputTarget) {
    (
        Fileset::new(&layout.src, STYLE_ENTRY),
        OutputTarget::new(layout.dest_path("css")),
    )
}

/// Assets that get content-hash versioned.
pub fn revisioned(layout: &Layout) -> (Fileset, OutputTarget) {
    (
        Fileset::with_patterns(&layout.dest, ["js/**/*.js", "css/**/*.css", "img/**/*"]),
        OutputTarget::new(&layout.dest),
    )
}

/// Everything the offline cache should hold.
pub fn precached(layout: &Layout) -> (Fileset, OutputTarget) {
    (
        Fileset::new(&layout.dest, "**/*.{js,html,css,png,jpg,gif}"),
        OutputTarget::new(&layout.dest),
    )
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;

    fn layout() -> Layout {
        Layout::default()
    }

    #[test]
    fn nested_image_keeps_one_parent() {
        let (input, output) = images(&layout());
        let rel = Path::new("images/icons/social/x.png");
        assert!(input.matcher().unwrap().is_match(rel));
        assert_eq!(output.place(rel), PathBuf::from("./dist/img/social/x.png"));
    }

    #[test]
    fn fonts_and_vendor_are_flattened() {
        let (_, fonts) = fonts(&layout());
        assert_eq!(
            fonts.place(Path::new("fonts/icons/a.woff")),
            PathBuf::from("./dist/fonts/a.woff")
        );
        let (_, vendor) = vendor(&layout());
        assert_eq!(
            vendor.place(Path::new("vendor/jquery/dist/jquery.js")),
            PathBuf::from("./dist/js/lib/jquery.js")
        );
    }

    #[test]
    fn script_output_skips_vendor_libraries() {
        let (input, _) = script_output(&layout());
        assert!(input.contains("main.js").unwrap());
        assert!(input.contains("library/x.js").unwrap());
        assert!(!input.contains("lib/jquery.js").unwrap());
    }
}
