//! Binary-level tests: catalog preparation and listing through the CLI,
//! plus the error surface when no embedding provider is configured.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn kaori_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("kaori");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let raw_src = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/raw_perfumes.example.json");
    fs::copy(raw_src, root.join("raw.json")).unwrap();

    let config = format!(
        r#"
[catalog]
path = "{}"

[server]
bind = "127.0.0.1:0"
"#,
        root.join("catalog.json").display()
    );
    let config_path = root.join("kaori.toml");
    fs::write(&config_path, config).unwrap();

    (tmp, config_path)
}

fn run(config: &Path, args: &[&str]) -> std::process::Output {
    Command::new(kaori_binary())
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .expect("failed to run kaori")
}

#[test]
fn test_catalog_prepare_and_list() {
    let (tmp, config) = setup_test_env();
    let raw = tmp.path().join("raw.json");

    let out = run(&config, &["catalog", "prepare", raw.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Processed 3 perfumes"), "stdout: {}", stdout);

    let out = run(&config, &["catalog", "list"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("shiro-savon-eau-de-parfum"));
    assert!(stdout.contains("dior-sauvage-eau-de-toilette"));
    assert!(stdout.contains("3 entries."));
}

#[test]
fn test_search_without_provider_reports_uninitialized() {
    let (tmp, config) = setup_test_env();
    let raw = tmp.path().join("raw.json");

    let out = run(&config, &["catalog", "prepare", raw.to_str().unwrap()]);
    assert!(out.status.success());

    // Provider defaults to "disabled"; the search must fail loudly rather
    // than return an empty result set.
    let out = run(&config, &["search", "柑橘"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("not initialized"), "stderr: {}", stderr);
}

#[test]
fn test_empty_search_request_rejected() {
    let (tmp, config) = setup_test_env();
    let raw = tmp.path().join("raw.json");
    let out = run(&config, &["catalog", "prepare", raw.to_str().unwrap()]);
    assert!(out.status.success());

    let out = run(&config, &["search", "   "]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("empty search request"), "stderr: {}", stderr);
}

#[test]
fn test_unknown_facet_value_rejected() {
    let (tmp, config) = setup_test_env();
    let raw = tmp.path().join("raw.json");
    let out = run(&config, &["catalog", "prepare", raw.to_str().unwrap()]);
    assert!(out.status.success());

    let out = run(&config, &["search", "柑橘", "--season", "梅雨"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("unknown season"), "stderr: {}", stderr);
}
