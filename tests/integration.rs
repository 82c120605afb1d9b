use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn sitesearch_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_sitesearch"))
}

const SNAPSHOT: &str = r#"{
  "pages": [
    {"id": 1, "url_segment": "services", "title": "Services",
     "content": "We offer consulting and managed hosting.",
     "last_edited": "2024-02-01T09:00:00Z"},
    {"id": 2, "parent_id": 1, "url_segment": "hosting", "title": "Managed hosting",
     "content": "Managed hosting with nightly backups and monitoring.",
     "last_edited": "2024-03-15T09:00:00Z"},
    {"id": 3, "parent_id": 2, "url_segment": "legacy-hosting", "title": "Legacy hosting",
     "content": "The legacy hosting platform is being retired.",
     "last_edited": "2023-11-20T09:00:00Z"},
    {"id": 4, "url_segment": "blog", "title": "Blog",
     "content": "Release notes, company news and hiring updates.",
     "last_edited": "2024-04-02T09:00:00Z"}
  ],
  "files": [
    {"id": 20, "filename": "hosting-prices.pdf", "title": "Hosting prices",
     "content": "Price list for managed hosting plans.",
     "last_edited": "2024-03-01T00:00:00Z"}
  ],
  "tracking": [{"page_id": 2, "file_id": 20}],
  "permissions": [
    {"code": "CMS_ACCESS_CMSMain", "label": "Access to Pages section"},
    {"code": "ADMIN", "label": "Full administrative rights", "hidden": true}
  ]
}"#;

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    fs::write(root.join("site.json"), SNAPSHOT).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/site.sqlite"

[search]
page_size = 10
wildcard_terms = true

[server]
bind = "127.0.0.1:7341"
"#,
        root.display()
    );

    let config_path = config_dir.join("sitesearch.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_sitesearch(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = sitesearch_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run sitesearch binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn setup_imported() -> (TempDir, PathBuf) {
    let (tmp, config_path) = setup_test_env();
    let snapshot = tmp.path().join("site.json");

    let (_, stderr, success) = run_sitesearch(&config_path, &["init"]);
    assert!(success, "init failed: {}", stderr);
    let (_, stderr, success) =
        run_sitesearch(&config_path, &["import", snapshot.to_str().unwrap()]);
    assert!(success, "import failed: {}", stderr);

    (tmp, config_path)
}

/// Ids in printed order, read from the `    id: N` lines.
fn result_ids(stdout: &str) -> Vec<i64> {
    stdout
        .lines()
        .filter_map(|l| l.trim().strip_prefix("id: "))
        .map(|id| id.parse().unwrap())
        .collect()
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_sitesearch(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/site.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_sitesearch(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_sitesearch(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_import_snapshot_twice() {
    let (tmp, config_path) = setup_imported();
    let snapshot = tmp.path().join("site.json");

    let (stdout, _, success) =
        run_sitesearch(&config_path, &["import", snapshot.to_str().unwrap()]);
    assert!(success);
    assert!(stdout.contains("pages: 4"));
    assert!(stdout.contains("files: 1"));
    assert!(stdout.contains("tracking links: 0"));
    assert!(stdout.contains("ok"));
}

#[test]
fn test_search_all_words() {
    let (_tmp, config_path) = setup_imported();

    let (stdout, stderr, success) = run_sitesearch(
        &config_path,
        &["search", "--all", "managed hosting", "--sort", "LastUpdated"],
    );
    assert!(success, "search failed: {}", stderr);
    assert_eq!(result_ids(&stdout), vec![2, 20, 1]);
    assert!(stdout.contains("for: +managed +hosting"));
}

#[test]
fn test_search_scope_includes_descendants_and_files() {
    let (_tmp, config_path) = setup_imported();

    let (stdout, _, success) = run_sitesearch(
        &config_path,
        &[
            "search",
            "--any",
            "hosting",
            "--only-show",
            "hosting",
            "--sort",
            "PageTitle",
        ],
    );
    assert!(success);
    assert_eq!(result_ids(&stdout), vec![20, 3, 2]);
}

#[test]
fn test_search_unknown_section_is_skipped() {
    let (_tmp, config_path) = setup_imported();

    let (stdout, stderr, success) = run_sitesearch(
        &config_path,
        &["search", "--any", "hosting", "--only-show", "nope,blog"],
    );
    assert!(success);
    assert!(stderr.contains("nope"), "expected a warning, got: {}", stderr);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_search_date_range() {
    let (_tmp, config_path) = setup_imported();

    let (stdout, _, success) = run_sitesearch(
        &config_path,
        &[
            "search",
            "--any",
            "hosting",
            "--from",
            "2024-03-01",
            "--sort",
            "LastUpdated",
        ],
    );
    assert!(success);
    assert_eq!(result_ids(&stdout), vec![2, 20]);
}

#[test]
fn test_search_exclusion_only_inverts() {
    let (_tmp, config_path) = setup_imported();

    let (stdout, _, success) = run_sitesearch(
        &config_path,
        &["search", "--without", "hosting", "--sort", "PageTitle"],
    );
    assert!(success);
    assert_eq!(result_ids(&stdout), vec![4]);
}

#[test]
fn test_search_paging() {
    let (_tmp, config_path) = setup_imported();

    let (stdout, _, success) = run_sitesearch(
        &config_path,
        &[
            "search",
            "--any",
            "hosting",
            "--sort",
            "PageTitle",
            "--page-size",
            "2",
        ],
    );
    assert!(success);
    assert_eq!(result_ids(&stdout), vec![20, 3]);
    assert!(stdout.contains("More results: --start 2"));

    let (stdout, _, _) = run_sitesearch(
        &config_path,
        &[
            "search",
            "--any",
            "hosting",
            "--sort",
            "PageTitle",
            "--page-size",
            "2",
            "--start",
            "2",
        ],
    );
    assert_eq!(result_ids(&stdout), vec![2, 1]);
}

#[test]
fn test_search_invalid_date_fails() {
    let (_tmp, config_path) = setup_imported();

    let (_, stderr, success) = run_sitesearch(
        &config_path,
        &["search", "--any", "hosting", "--from", "2024-02-30"],
    );
    assert!(!success);
    assert!(stderr.contains("From"), "got: {}", stderr);
}

#[test]
fn test_search_rejects_offset_beyond_sql_range() {
    let (_tmp, config_path) = setup_imported();

    let (stdout, stderr, success) = run_sitesearch(
        &config_path,
        &["search", "--any", "hosting", "--start", "18446744073709551615"],
    );
    assert!(!success);
    assert!(stderr.contains("invalid start offset"), "got: {}", stderr);
    assert!(!stderr.contains("panicked"), "got: {}", stderr);
    assert!(stdout.is_empty());
}

#[test]
fn test_query_shows_current_and_engine_text() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_sitesearch(
        &config_path,
        &["query", "--all", "red  green", "--phrase", "dark blue", "--without", "grey"],
    );
    assert!(success);
    assert!(stdout.contains("current:  +red +green \"dark blue\" -grey"));
    assert!(stdout.contains("engine:   +red* +green* \"dark blue\" -grey*"));
    assert!(stdout.contains("inverted: false"));
    assert!(stdout.contains("sort:     Relevance DESC"));
}

#[test]
fn test_permissions_include_hidden() {
    let (_tmp, config_path) = setup_imported();

    let (stdout, _, success) = run_sitesearch(&config_path, &["permissions"]);
    assert!(success);
    assert!(stdout.contains("ADMIN\tFull administrative rights"));
    assert!(stdout.contains("CMS_ACCESS_CMSMain\tAccess to Pages section"));
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) =
        run_sitesearch(&tmp.path().join("nope.toml"), &["init"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
