use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn wps_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("wps");
    path
}

fn page(title: &str, popularity: f64, templates: &[&str], redirects: &[&str]) -> String {
    let redirect: Vec<_> = redirects
        .iter()
        .map(|r| json!({"title": r, "namespace": 0}))
        .collect();
    json!({
        "title": title,
        "namespace": 0,
        "template": templates,
        "popularity_score": popularity,
        "text": format!("{title}は日本の都市である。"),
        "opening_text": format!("{title} opening"),
        "auxiliary_text": ["aux one", "aux two"],
        "category": ["日本の都市"],
        "heading": ["歴史", "地理"],
        "source_text": format!("'''{title}'''"),
        "incoming_links": 120,
        "redirect": redirect,
    })
    .to_string()
}

fn write_dump(path: &Path, pages: &[String]) {
    let file = fs::File::create(path).unwrap();
    let mut gz = GzEncoder::new(file, Compression::default());
    for p in pages {
        writeln!(gz, r#"{{"index":{{"_type":"page","_id":"1"}}}}"#).unwrap();
        writeln!(gz, "{}", p).unwrap();
    }
    gz.finish().unwrap();
}

fn setup_test_env() -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/wp.sqlite"

[import]
batch_size = 2

[server]
bind = "127.0.0.1:8081"
"#,
        root.display()
    );
    let config_path = config_dir.join("wps.toml");
    fs::write(&config_path, config_content).unwrap();

    let dump_path = root.join("dump.json.gz");
    write_dump(
        &dump_path,
        &[
            page("東京都", 0.0012, &[], &["東京", "Edo"]),
            page("徳島県", 0.0003, &[], &[]),
            page("Hidden", 0.5, &["Template:性的"], &["Hidden alias"]),
            page("Obscure", 0.0000001, &[], &[]),
            page("大阪府", 0.0009, &[], &[]),
        ],
    );

    (tmp, config_path, dump_path)
}

fn run_wps(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = wps_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run wps binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn imported_env() -> (TempDir, PathBuf) {
    let (tmp, config, dump) = setup_test_env();
    let (_, stderr, ok) = run_wps(&config, &["init"]);
    assert!(ok, "init failed: {}", stderr);
    let (_, stderr, ok) = run_wps(
        &config,
        &["import", dump.to_str().unwrap(), "--progress", "off"],
    );
    assert!(ok, "import failed: {}", stderr);
    (tmp, config)
}

#[test]
fn test_init_is_idempotent() {
    let (_tmp, config, _) = setup_test_env();
    let (stdout, stderr, ok) = run_wps(&config, &["init"]);
    assert!(ok, "init failed: {}", stderr);
    assert!(stdout.contains("Database initialized successfully"));

    let (_, stderr, ok) = run_wps(&config, &["init"]);
    assert!(ok, "second init failed: {}", stderr);
}

#[test]
fn test_import_reports_tallies() {
    let (_tmp, config, dump) = setup_test_env();
    let (stdout, stderr, ok) = run_wps(
        &config,
        &["import", dump.to_str().unwrap(), "--progress", "json", "--expected", "5"],
    );
    assert!(ok, "import failed: {}", stderr);

    assert!(stdout.contains("total pairs: 5"), "{}", stdout);
    assert!(stdout.contains("inserted articles: 3"), "{}", stdout);
    assert!(stdout.contains("restricted articles: 1"), "{}", stdout);
    assert!(stdout.contains("unpopular articles: 1"), "{}", stdout);
    assert!(stdout.contains("redirects inserted: 2"), "{}", stdout);
    assert!(stdout.contains("dangling redirects pruned: 0"), "{}", stdout);
    assert!(stdout.trim_end().ends_with("ok"));

    // JSON progress goes to stderr, one object per line.
    let events: Vec<serde_json::Value> = stderr
        .lines()
        .filter(|l| l.starts_with('{'))
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert!(!events.is_empty(), "no progress events: {}", stderr);
}

#[test]
fn test_import_missing_dump_fails() {
    let (tmp, config, _) = setup_test_env();
    let missing = tmp.path().join("missing.json.gz");
    let (_, _, ok) = run_wps(&config, &["import", missing.to_str().unwrap()]);
    assert!(!ok);
}

#[test]
fn test_get_and_fields() {
    let (_tmp, config) = imported_env();

    let (stdout, stderr, ok) = run_wps(&config, &["get", "東京都"]);
    assert!(ok, "get failed: {}", stderr);
    assert!(stdout.contains("title:              東京都"));
    assert!(stdout.contains("歴史"));

    let (stdout, _, ok) = run_wps(&config, &["get", "東京都", "--field", "text"]);
    assert!(ok);
    assert_eq!(stdout.trim_end(), "東京都は日本の都市である。");

    let (stdout, _, ok) = run_wps(&config, &["get", "東京都", "--field", "wiki_text"]);
    assert!(ok);
    assert_eq!(stdout.trim_end(), "'''東京都'''");
}

#[test]
fn test_filtered_articles_are_absent() {
    let (_tmp, config) = imported_env();

    let (_, stderr, ok) = run_wps(&config, &["get", "Hidden"]);
    assert!(!ok);
    assert!(stderr.contains("article not found"));

    let (_, _, ok) = run_wps(&config, &["get", "Obscure"]);
    assert!(!ok);
}

#[test]
fn test_find_by_prefix() {
    let (_tmp, config) = imported_env();

    let (stdout, stderr, ok) = run_wps(&config, &["find", "徳島"]);
    assert!(ok, "find failed: {}", stderr);
    assert!(stdout.contains("徳島県"));

    let (_, _, ok) = run_wps(&config, &["find", "京都"]);
    assert!(!ok);
}

#[test]
fn test_redirects() {
    let (_tmp, config) = imported_env();

    let (stdout, _, ok) = run_wps(&config, &["redirect", "Edo"]);
    assert!(ok);
    assert_eq!(stdout.trim_end(), "Edo -> 東京都");

    // Redirects of a restricted article are never stored.
    let (_, _, ok) = run_wps(&config, &["redirect", "Hidden alias"]);
    assert!(!ok);
}

#[test]
fn test_stats() {
    let (_tmp, config) = imported_env();
    let (stdout, stderr, ok) = run_wps(&config, &["stats"]);
    assert!(ok, "stats failed: {}", stderr);
    assert!(stdout.contains("Articles:    3"), "{}", stdout);
    assert!(stdout.contains("Redirects:   2"), "{}", stdout);
}

#[test]
fn test_export_json_lines() {
    let (tmp, config) = imported_env();
    let out = tmp.path().join("out").join("articles.jsonl");
    let (_, stderr, ok) = run_wps(&config, &["export", "--output", out.to_str().unwrap()]);
    assert!(ok, "export failed: {}", stderr);

    let content = fs::read_to_string(&out).unwrap();
    let mut titles: Vec<String> = content
        .lines()
        .map(|l| {
            let v: serde_json::Value = serde_json::from_str(l).unwrap();
            v["title"].as_str().unwrap().to_string()
        })
        .collect();
    titles.sort();
    assert_eq!(titles, vec!["大阪府", "徳島県", "東京都"]);
}
