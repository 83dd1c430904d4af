// tests/config_loading.rs

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use assetrun::config::{DEFAULT_CONFIG_FILE, load_for_root};
use assetrun::errors::BuildError;
use assetrun::pipeline::Layout;
use tempfile::TempDir;

#[test]
fn missing_project_config_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let cfg = load_for_root(dir.path(), None).unwrap();

    assert_eq!(cfg.debounce(), Duration::from_millis(200));
    assert!(cfg.transform_commands().is_empty());
}

#[test]
fn project_config_is_picked_up_from_the_root() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(DEFAULT_CONFIG_FILE),
        r#"
[paths]
src = "site"
dest = "public"

[watch]
debounce_ms = 50

[cache]
cache_id = "my-app"

[transform]
styles = "sass site/styles/app.scss public/css/main.css"
"#,
    )
    .unwrap();

    let cfg = load_for_root(dir.path(), None).unwrap();
    assert_eq!(cfg.debounce(), Duration::from_millis(50));
    assert_eq!(cfg.transform_commands().len(), 1);

    let layout = Layout::from_config(dir.path(), &cfg);
    assert_eq!(layout.src, dir.path().join("site"));
    assert_eq!(layout.dest, dir.path().join("public"));
    assert_eq!(layout.tmp, dir.path().join(".tmp"));
    assert_eq!(layout.cache_id, "my-app");
    assert_eq!(layout.src_prefix(), "site");
}

#[test]
fn explicit_config_path_must_exist() {
    let dir = TempDir::new().unwrap();
    let missing = PathBuf::from(dir.path()).join("nope.toml");

    let err = load_for_root(dir.path(), Some(missing.as_path())).unwrap_err();
    assert!(matches!(err, BuildError::IoError(_)));
}

#[test]
fn explicit_config_wins_over_the_project_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[watch]\ndebounce_ms = 0\n").unwrap();
    let explicit = dir.path().join("ci.toml");
    fs::write(&explicit, "[engine]\ntask_timeout_secs = 5\n").unwrap();

    let cfg = load_for_root(dir.path(), Some(explicit.as_path())).unwrap();
    assert_eq!(cfg.task_timeout(), Some(Duration::from_secs(5)));
}

#[test]
fn invalid_project_config_is_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[paths]\ndest = \"app\"\n").unwrap();

    let err = load_for_root(dir.path(), None).unwrap_err();
    assert!(matches!(err, BuildError::ConfigError(_)));
}
