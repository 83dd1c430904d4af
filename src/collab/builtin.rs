// src/collab/builtin.rs

//! Built-in fallbacks used when no external command is configured for a
//! transform.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;
use tracing::debug;

use crate::collab::fileset::{Fileset, OutputTarget};

static HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--[^\[].*?-->").expect("valid regex"));

static JS_BLOCK_COMMENT_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)^\s*/\*.*?\*/\s*$").expect("valid regex"));

/// Compile every stylesheet input to compressed CSS and concatenate the
/// results into `<output>/<bundle>`.
pub fn bundle(files: &[PathBuf], output: &OutputTarget, bundle: &str) -> Result<Vec<PathBuf>> {
    if files.is_empty() {
        debug!(bundle, "no sources to bundle");
        return Ok(Vec::new());
    }

    let opts = grass::Options::default().style(grass::OutputStyle::Compressed);
    let mut combined = String::new();
    for file in files {
        let text = grass::from_path(file, &opts)
            .map_err(|e| anyhow!("compiling stylesheet {:?}: {}", file, e))?;
        combined.push_str(&text);
        if !text.ends_with('\n') {
            combined.push('\n');
        }
    }

    let dest = output.dir.join(bundle);
    write_file(&dest, combined.as_bytes())?;
    Ok(vec![dest])
}

/// Copy each input to its placed location under `output`.
pub fn copy_placed(files: &[PathBuf], input: &Fileset, output: &OutputTarget) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let dest = placed(file, input, output)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating dir {:?}", parent))?;
        }
        fs::copy(file, &dest).with_context(|| format!("copying {:?} to {:?}", file, dest))?;
        written.push(dest);
    }
    Ok(written)
}

/// Fail on the first input that is not readable UTF-8 text.
pub fn lint(files: &[PathBuf]) -> Result<Vec<PathBuf>> {
    for file in files {
        read_text(file)?;
    }
    Ok(files.to_vec())
}

/// Rewrite each input through `minify` into its placed location.
pub fn minify_each(
    files: &[PathBuf],
    input: &Fileset,
    output: &OutputTarget,
    minify: fn(&str) -> String,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let text = read_text(file)?;
        let dest = placed(file, input, output)?;
        write_file(&dest, minify(&text).as_bytes())?;
        written.push(dest);
    }
    Ok(written)
}

/// Drop comments (keeping conditional `<!--[if ...]>` ones), indentation and
/// blank lines.
pub fn minify_html(text: &str) -> String {
    let stripped = HTML_COMMENT.replace_all(text, "");
    squeeze_lines(&stripped, |_| false)
}

/// Drop whole-line comments, indentation and blank lines.
pub fn minify_script(text: &str) -> String {
    let stripped = JS_BLOCK_COMMENT_LINES.replace_all(text, "");
    squeeze_lines(&stripped, |line| line.starts_with("//"))
}

fn squeeze_lines(text: &str, skip: impl Fn(&str) -> bool) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty() && !skip(l)) {
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn placed(file: &Path, input: &Fileset, output: &OutputTarget) -> Result<PathBuf> {
    let rel = file
        .strip_prefix(&input.base)
        .with_context(|| format!("{:?} is outside fileset base {:?}", file, input.base))?;
    Ok(output.place(rel))
}

pub(crate) fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("reading {:?}", path))?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(_) => bail!("{:?} is not valid UTF-8", path),
    }
}

pub(crate) fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
    }
    fs::write(path, contents).with_context(|| format!("writing {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_minifier_keeps_conditional_comments() {
        let html = "<html>\n  <!-- nav -->\n  <!--[if IE]><p>old</p><![endif]-->\n\n  <body>hi</body>\n</html>\n";
        let out = minify_html(html);
        assert!(!out.contains("nav"));
        assert!(out.contains("<!--[if IE]>"));
        assert_eq!(out.lines().count(), 4);
    }

    #[test]
    fn script_minifier_drops_comment_lines_only() {
        let js = "// header\n/* block\n   comment */\nconst url = 'http://x';\n\n  run();\n";
        let out = minify_script(js);
        assert_eq!(out, "const url = 'http://x';\nrun();\n");
    }
}
