// src/collab/manifest.rs

//! Content-hash asset versioning and the offline-cache manifest.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use serde::Serialize;
use tracing::{debug, info};

use crate::collab::builtin::{read_text, write_file};
use crate::collab::fileset::{list_files, relative_slash_path};

/// Written next to the versioned assets: original path -> versioned path.
pub const REV_MANIFEST: &str = "rev-manifest.json";
/// Offline-cache manifest written into the output root.
pub const PRECACHE_MANIFEST: &str = "precache-manifest.json";

const REV_HASH_LEN: usize = 10;
const PRECACHE_HASH_LEN: usize = 16;

/// Compute the blake3 hash of a single file.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file =
        File::open(path).with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Rename each file under `root` to `stem-<hash>.ext`, rewrite references to
/// the renamed files, and write [`REV_MANIFEST`].
///
/// Leaf assets are versioned first. Stylesheets and scripts have their
/// references rewritten before they are hashed, so their names change when
/// an asset they point at changes. HTML documents are rewritten last.
///
/// Returns the versioned paths.
pub fn revision(files: &[PathBuf], root: &Path) -> Result<Vec<PathBuf>> {
    let mut manifest: BTreeMap<String, String> = BTreeMap::new();
    let mut written = Vec::with_capacity(files.len());

    let (referencing, leaves): (Vec<&PathBuf>, Vec<&PathBuf>) =
        files.iter().partition(|f| has_extension(f, &["css", "js"]));

    for file in leaves {
        if let Some(renamed) = version_file(file, root, &mut manifest)? {
            written.push(renamed);
        }
    }

    let leaf_pairs = replacement_pairs(&manifest);
    for file in referencing {
        rewrite_document(file, &leaf_pairs)?;
        if let Some(renamed) = version_file(file, root, &mut manifest)? {
            written.push(renamed);
        }
    }

    let pairs = replacement_pairs(&manifest);
    for doc in list_files(root)? {
        let is_doc = has_extension(&doc, &["html"])
            || (has_extension(&doc, &["css"]) && !written.contains(&doc));
        if is_doc {
            rewrite_document(&doc, &pairs)?;
        }
    }

    let json = serde_json::to_string_pretty(&manifest)?;
    write_file(&root.join(REV_MANIFEST), json.as_bytes())?;
    info!(assets = manifest.len(), "wrote revision manifest");

    Ok(written)
}

fn has_extension(path: &Path, exts: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| exts.contains(&e))
}

/// Hash `file`, rename it in place and record the rename in `manifest`.
fn version_file(
    file: &Path,
    root: &Path,
    manifest: &mut BTreeMap<String, String>,
) -> Result<Option<PathBuf>> {
    let Some(old_rel) = relative_slash_path(root, file) else {
        return Ok(None);
    };
    let hash = compute_file_hash(file)?;
    let renamed = file.with_file_name(versioned_name(file, &hash[..REV_HASH_LEN]));
    fs::rename(file, &renamed)
        .with_context(|| format!("renaming {:?} to {:?}", file, renamed))?;

    if let Some(new_rel) = relative_slash_path(root, &renamed) {
        debug!(from = %old_rel, to = %new_rel, "versioned asset");
        manifest.insert(old_rel, new_rel);
    }
    Ok(Some(renamed))
}

fn versioned_name(path: &Path, hash: &str) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match path.extension() {
        Some(ext) => format!("{stem}-{hash}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{hash}"),
    }
}

// Longest first so `js/app.js` is not clobbered by a shorter prefix.
fn replacement_pairs(manifest: &BTreeMap<String, String>) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = manifest
        .iter()
        .map(|(from, to)| (from.clone(), to.clone()))
        .collect();
    pairs.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    pairs
}

fn rewrite_document(doc: &Path, pairs: &[(String, String)]) -> Result<()> {
    if pairs.is_empty() {
        return Ok(());
    }

    let text = read_text(doc)?;
    let mut updated = text.clone();
    for (from, to) in pairs {
        updated = updated.replace(from.as_str(), to.as_str());
    }
    if updated != text {
        debug!(?doc, "rewrote asset references");
        write_file(doc, updated.as_bytes())?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrecacheManifest {
    cache_id: String,
    entries: Vec<PrecacheEntry>,
}

#[derive(Debug, Serialize)]
struct PrecacheEntry {
    url: String,
    revision: String,
}

/// Write [`PRECACHE_MANIFEST`] into `root` listing every file with its
/// content revision. URLs are relative to `root`.
pub fn precache(files: &[PathBuf], root: &Path, cache_id: &str) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::with_capacity(files.len());
    for file in files {
        let Some(url) = relative_slash_path(root, file) else {
            continue;
        };
        let hash = compute_file_hash(file)?;
        entries.push(PrecacheEntry {
            url,
            revision: hash[..PRECACHE_HASH_LEN].to_string(),
        });
    }

    let manifest = PrecacheManifest {
        cache_id: cache_id.to_string(),
        entries,
    };
    let dest = root.join(PRECACHE_MANIFEST);
    let json = serde_json::to_string_pretty(&manifest)?;
    write_file(&dest, json.as_bytes())?;
    info!(entries = manifest.entries.len(), cache_id, "wrote precache manifest");

    Ok(vec![dest])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versioned_name_inserts_hash_before_extension() {
        assert_eq!(
            versioned_name(Path::new("css/main.css"), "abc123"),
            "main-abc123.css"
        );
        assert_eq!(versioned_name(Path::new("LICENSE"), "abc123"), "LICENSE-abc123");
    }

    fn versioned_css(image: &str) -> (String, String) {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("css")).unwrap();
        fs::create_dir_all(root.join("img")).unwrap();
        fs::write(root.join("css/main.css"), "a{background:url(../img/a.png)}\n").unwrap();
        fs::write(root.join("img/a.png"), image).unwrap();

        let files = vec![root.join("css/main.css"), root.join("img/a.png")];
        let written = revision(&files, root).unwrap();
        let css = written
            .iter()
            .find(|p| has_extension(p, &["css"]))
            .unwrap();
        let name = css.file_name().unwrap().to_string_lossy().into_owned();
        (name, fs::read_to_string(css).unwrap())
    }

    #[test]
    fn stylesheet_name_tracks_the_assets_it_references() {
        let (first_name, first_css) = versioned_css("one");
        let (second_name, second_css) = versioned_css("two");

        assert_ne!(first_name, second_name);
        assert_ne!(first_css, second_css);
        assert!(first_css.contains("../img/a-") && !first_css.contains("img/a.png"));
    }

    #[test]
    fn html_is_rewritten_after_scripts_are_versioned() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("js")).unwrap();
        fs::write(root.join("js/main.js"), "run();\n").unwrap();
        fs::write(root.join("index.html"), "<script src=\"js/main.js\"></script>\n").unwrap();

        revision(&[root.join("js/main.js")], root).unwrap();

        let manifest: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(root.join(REV_MANIFEST)).unwrap()).unwrap();
        let versioned = manifest.get("js/main.js").unwrap();
        let html = fs::read_to_string(root.join("index.html")).unwrap();
        assert!(html.contains(versioned.as_str()));
    }
}
