use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

fn blocks(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_blocks"))
        .current_dir(dir)
        .arg("--no-color")
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run blocks binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write(dir: &TempDir, name: &str, content: &str) {
    fs::write(dir.path().join(name), content).expect("write input file");
}

#[test]
fn fixtures_pass() {
    let fixtures = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");
    let output = blocks(Path::new(fixtures), &["test", fixtures]);
    assert!(output.status.success(), "fixtures failed:\n{}", stderr(&output));
    assert!(stderr(&output).contains("test result: ok."));
}

#[test]
fn fixture_categories_can_be_selected() {
    let fixtures = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");
    let output = blocks(Path::new(fixtures), &["test", fixtures, "-c", "links"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stderr(&output).contains("test result: ok. 5 passed, 0 failed"));
}

#[test]
fn failing_fixture_reports_reason() {
    let dir = TempDir::new().expect("tempdir");
    write(
        &dir,
        "wrong.test.html",
        "---\ndescription = \"wrong text\"\nexpect_text = [\"nope\"]\n---\n<p>yes</p>\n",
    );
    let output = blocks(dir.path(), &["test", "wrong.test.html"]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("FAIL  wrong text"), "{}", err);
    assert!(err.contains("block text mismatch"), "{}", err);
}

#[test]
fn convert_prints_json_records() {
    let dir = TempDir::new().expect("tempdir");
    write(&dir, "post.html", "<h1>Hi</h1><ul><li><b>one</b></li></ul>");

    let output = blocks(dir.path(), &["convert", "post.html"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let value: Value = serde_json::from_str(&stdout(&output)).expect("json output");
    assert_eq!(value[0]["style"], "h1");
    assert_eq!(value[1]["listItem"], "bullet");
    assert_eq!(value[1]["children"][0]["marks"][0], "strong");
}

#[test]
fn convert_markdown_with_linkify() {
    let dir = TempDir::new().expect("tempdir");
    write(&dir, "post.html", "<p>Go to example.com now</p>");

    let output = blocks(dir.path(), &["convert", "post.html", "--linkify", "--format", "markdown"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "Go to [example.com](https://example.com) now\n");
}

#[test]
fn convert_reports_warnings_on_stderr() {
    let dir = TempDir::new().expect("tempdir");
    write(&dir, "post.html", "<p><em>never closed</p>");

    let output = blocks(dir.path(), &["convert", "post.html", "--format", "text"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "never closed\n");
    assert!(stderr(&output).contains("unclosed `<em>` tag"));

    let quiet = blocks(dir.path(), &["convert", "post.html", "--quiet-warnings"]);
    assert!(quiet.status.success());
    assert!(!stderr(&quiet).contains("unclosed"));
}

#[test]
fn config_file_controls_anchors() {
    let dir = TempDir::new().expect("tempdir");
    write(&dir, "post.html", "<p><a href=\"https://example.com\">site</a></p>");
    write(&dir, "blocks.toml", "[convert]\nanchor_links = false\n");

    let output = blocks(dir.path(), &["convert", "post.html"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let value: Value = serde_json::from_str(&stdout(&output)).expect("json output");
    assert_eq!(value[0]["markDefs"], Value::Array(Vec::new()));
    assert_eq!(value[0]["children"][0]["text"], "site");
}

#[test]
fn unknown_config_key_is_an_error() {
    let dir = TempDir::new().expect("tempdir");
    write(&dir, "post.html", "<p>x</p>");
    write(&dir, "custom.toml", "[convert]\nanchors = true\n");

    let output = blocks(dir.path(), &["--config", "custom.toml", "convert", "post.html"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("invalid config"), "{}", stderr(&output));
}

#[test]
fn missing_input_is_an_error() {
    let dir = TempDir::new().expect("tempdir");
    let output = blocks(dir.path(), &["convert", "absent.html"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("cannot read 'absent.html'"));
}

#[test]
fn linkify_in_place() {
    let dir = TempDir::new().expect("tempdir");
    write(
        &dir,
        "doc.json",
        r#"[{"_key": "b0", "children": [{"_key": "s0", "text": "see docs.rs"}]}]"#,
    );

    let output = blocks(dir.path(), &["linkify", "doc.json", "--in-place"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).is_empty());

    let text = fs::read_to_string(dir.path().join("doc.json")).expect("read back");
    let value: Value = serde_json::from_str(&text).expect("json");
    assert_eq!(value[0]["markDefs"][0]["href"], "https://docs.rs");
    assert_eq!(value[0]["children"][1]["text"], "docs.rs");
    assert_eq!(value[0]["children"][1]["key"], "s0-1");
}

#[test]
fn linkify_rejects_invalid_json() {
    let dir = TempDir::new().expect("tempdir");
    write(&dir, "doc.json", "[{\"id\": \"b\",\n  \"children\": [}]");

    let output = blocks(dir.path(), &["linkify", "doc.json"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("invalid JSON in 'doc.json'"), "{}", stderr(&output));
}

#[test]
fn posts_become_ndjson_records() {
    let dir = TempDir::new().expect("tempdir");
    let export = serde_json::json!([
        {
            "id": 7,
            "slug": "hello-world",
            "date_gmt": "2021-03-04T05:06:07",
            "title": { "rendered": "Hello &amp; welcome&#8230;" },
            "excerpt": { "rendered": "<p>A short summary.</p>\n" },
            "content": { "rendered": "<p>Body text.</p>" }
        },
        {
            "id": 8,
            "slug": "second",
            "title": { "rendered": "Second" },
            "excerpt": { "rendered": "" },
            "content": { "rendered": "<h2></h2><p>Only paragraph here.</p>" }
        }
    ]);
    write(&dir, "export.json", &export.to_string());

    let output = blocks(dir.path(), &["posts", "export.json", "-o", "posts.ndjson"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let text = fs::read_to_string(dir.path().join("posts.ndjson")).expect("read output");
    let records: Vec<Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).expect("record"))
        .collect();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0]["_id"], "wp-post-7");
    assert_eq!(records[0]["_type"], "post");
    assert_eq!(records[0]["title"], "Hello & welcome\u{2026}");
    assert_eq!(records[0]["date"], "2021-03-04T05:06:07Z");
    assert_eq!(records[0]["excerpt"], "A short summary.");
    assert_eq!(records[0]["body"][0]["children"][0]["text"], "Body text.");

    assert_eq!(records[1]["excerpt"], "Only paragraph here.");
    assert!(records[1].get("date").is_none());
}
