//! Integration tests for template loading and the offline cache


use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use harness::{PyProject, run_graft_env};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const TEMPLATE_CONFIG: &str = r#"{
  "project name": {"input": "demo", "prompt": "Project name"},
  "data base": {"input": "sqlite:///app.db", "isEnv": true},
  "plugins": {
    "stats": {
      "about": "Usage metrics",
      "modulePath": [["pkg", "stats.py"]]
    }
  }
}"#;

fn build_template_zip(main_py: &str) -> Vec<u8> {
    let entries = [
        ("demo-HEAD/templateConfig.json", TEMPLATE_CONFIG),
        ("demo-HEAD/main.py", main_py),
        ("demo-HEAD/pkg/__init__.py", ""),
        ("demo-HEAD/pkg/helpers.py", "import os\n"),
        ("demo-HEAD/pkg/stats.py", "x = 1\n"),
    ];
    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for (name, contents) in entries {
            zip.start_file(name, options).expect("Failed to add entry");
            zip.write_all(contents.as_bytes())
                .expect("Failed to write entry");
        }
        zip.finish().expect("Failed to finish zip");
    }
    buffer
}

fn seed_cache(cache_root: &Path, bytes: &[u8]) {
    let entry = cache_root.join("offline/template/github.com/acme/demo");
    fs::create_dir_all(&entry).expect("Failed to create cache entry");
    fs::write(entry.join("template.zip"), bytes).expect("Failed to write archive");
    fs::write(
        entry.join("meta.json"),
        r#"{"name": "demo", "owner": "acme", "source_url": "https://github.com/acme/demo", "cached_at": "2025-11-02T12:00:00Z", "has_archive": true}"#,
    )
    .expect("Failed to write meta");
}

fn load_from_cache(workspace: &PyProject, cache_root: &Path, extra_args: &[&str]) -> (String, String, bool) {
    let mut args = vec![
        "load-template",
        "--local",
        "--source",
        "github.com/acme",
        "--template-name",
        "demo",
        "--project-name",
        "proj",
        "--yes",
    ];
    args.extend_from_slice(extra_args);
    run_graft_env(
        workspace.path(),
        &args,
        &[("GRAFT_CACHE_DIR", cache_root.to_str().unwrap())],
    )
}

#[test]
fn test_load_template_from_cache() {
    let workspace = PyProject::new();
    let cache = PyProject::new();
    seed_cache(cache.path(), &build_template_zip("import os\n"));

    let (_stdout, stderr, success) = load_from_cache(&workspace, cache.path(), &[]);
    assert!(success, "load-template should succeed: {}", stderr);

    let proj = workspace.path().join("proj");
    assert!(proj.join("main.py").is_file());
    assert!(proj.join("pkg/helpers.py").is_file());
    assert!(
        proj.join("pkg/stats.py").is_file(),
        "plugins stay in place unless deselected"
    );
    assert!(
        !proj.join("templateConfig.json").exists(),
        "the config manifest is never materialized"
    );
}

#[test]
fn test_load_template_removes_unimported_plugin() {
    let workspace = PyProject::new();
    let cache = PyProject::new();
    seed_cache(cache.path(), &build_template_zip("import os\n"));

    let (_stdout, stderr, success) =
        load_from_cache(&workspace, cache.path(), &["--without", "stats"]);
    assert!(success, "load-template should succeed: {}", stderr);

    let proj = workspace.path().join("proj");
    assert!(
        !proj.join("pkg/stats.py").exists(),
        "an unimported deselected plugin is deleted"
    );
    assert!(proj.join("pkg/helpers.py").is_file());
}

#[test]
fn test_load_template_keeps_imported_plugin() {
    let workspace = PyProject::new();
    let cache = PyProject::new();
    seed_cache(
        cache.path(),
        &build_template_zip("import pkg.stats\n"),
    );

    let (_stdout, stderr, success) =
        load_from_cache(&workspace, cache.path(), &["--without", "stats"]);
    assert!(success, "load-template should succeed: {}", stderr);

    let proj = workspace.path().join("proj");
    assert!(
        proj.join("pkg/stats.py").is_file(),
        "a plugin imported outside the deselected set survives"
    );
}

#[test]
fn test_load_template_writes_env_file() {
    let workspace = PyProject::new();
    let cache = PyProject::new();
    seed_cache(cache.path(), &build_template_zip("import os\n"));

    let (_stdout, stderr, success) = load_from_cache(&workspace, cache.path(), &["--env"]);
    assert!(success, "load-template should succeed: {}", stderr);

    let env = fs::read_to_string(workspace.path().join("proj/.env"))
        .expect(".env should be written");
    assert_eq!(env, "DATA_BASE=sqlite:///app.db");
}

#[test]
fn test_load_template_refuses_existing_target() {
    let workspace = PyProject::new();
    workspace.add_dir("proj");
    let cache = PyProject::new();
    seed_cache(cache.path(), &build_template_zip("import os\n"));

    let (_stdout, stderr, success) = load_from_cache(&workspace, cache.path(), &[]);
    assert!(!success);
    assert!(
        stderr.contains("already exists"),
        "error names the conflict: {}",
        stderr
    );
}

#[test]
fn test_load_template_cache_miss() {
    let workspace = PyProject::new();
    let cache = PyProject::new();

    let (_stdout, stderr, success) = load_from_cache(&workspace, cache.path(), &[]);
    assert!(!success);
    assert!(
        stderr.contains("no cached template at"),
        "cache misses are reported: {}",
        stderr
    );
}

#[test]
fn test_cache_template_only_ref() {
    let workspace = PyProject::new();
    let cache = PyProject::new();

    let (stdout, _stderr, success) = run_graft_env(
        workspace.path(),
        &[
            "cache-template",
            "https://github.com/acme/demo",
            "--only-ref",
        ],
        &[("GRAFT_CACHE_DIR", cache.path().to_str().unwrap())],
    );
    assert!(success, "reference-only caching needs no network");
    assert!(stdout.contains("cached demo at"), "stdout: {}", stdout);

    let entry = cache.path().join("offline/template/github.com/acme/demo");
    assert!(!entry.join("template.zip").exists());
    let meta = fs::read_to_string(entry.join("meta.json")).expect("meta.json should exist");
    let doc: serde_json::Value = serde_json::from_str(&meta).unwrap();
    assert_eq!(doc["name"], "demo");
    assert_eq!(doc["owner"], "acme");
    assert_eq!(doc["has_archive"], false);
}

#[test]
fn test_cache_template_rejects_malformed_url() {
    let workspace = PyProject::new();
    let cache = PyProject::new();

    let (_stdout, stderr, success) = run_graft_env(
        workspace.path(),
        &["cache-template", "acme/demo", "--only-ref"],
        &[("GRAFT_CACHE_DIR", cache.path().to_str().unwrap())],
    );
    assert!(!success);
    assert!(
        stderr.contains("unsupported template url"),
        "stderr: {}",
        stderr
    );
}

#[test]
fn test_show_cache_lists_entries() {
    let workspace = PyProject::new();
    let cache = PyProject::new();
    seed_cache(cache.path(), &build_template_zip("import os\n"));

    let (stdout, _stderr, success) = run_graft_env(
        workspace.path(),
        &["show-cache"],
        &[("GRAFT_CACHE_DIR", cache.path().to_str().unwrap())],
    );
    assert!(success);
    assert!(stdout.contains("github.com"), "stdout: {}", stdout);
    assert!(stdout.contains("template.zip"), "stdout: {}", stdout);
    assert!(stdout.contains("meta.json"), "stdout: {}", stdout);
    assert!(
        stdout.contains("└── ") || stdout.contains("├── "),
        "listing uses tree connectors: {}",
        stdout
    );
}

#[test]
fn test_show_cache_narrows_to_subdirectory() {
    let workspace = PyProject::new();
    let cache = PyProject::new();
    seed_cache(cache.path(), &build_template_zip("import os\n"));

    let (stdout, _stderr, success) = run_graft_env(
        workspace.path(),
        &["show-cache", "offline/template/github.com"],
        &[("GRAFT_CACHE_DIR", cache.path().to_str().unwrap())],
    );
    assert!(success);
    assert!(stdout.starts_with("github.com\n"), "stdout: {}", stdout);
    assert!(stdout.contains("acme"), "stdout: {}", stdout);
}

#[test]
fn test_show_cache_missing_directory() {
    let workspace = PyProject::new();
    let cache = PyProject::new();

    let (stdout, _stderr, success) = run_graft_env(
        workspace.path(),
        &["show-cache", "offline/template"],
        &[("GRAFT_CACHE_DIR", cache.path().to_str().unwrap())],
    );
    assert!(success);
    assert!(stdout.contains("cache is empty"), "stdout: {}", stdout);
}
