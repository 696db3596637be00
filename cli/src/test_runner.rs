//! Runner for `.test.html` conversion fixtures.
//!
//! A fixture is an HTML body preceded by TOML frontmatter between `---` lines:
//!
//! ```text
//! ---
//! description = "bold inside a list item"
//! expect_text = ["one", "two"]
//! expect_styles = ["bullet", "bullet"]
//! ---
//! <ul><li><b>one</b></li><li>two</li></ul>
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use blocks::Document;
use blocks::parser::{AnchorPolicy, ConvertOptions, ConversionWarning, Converter};
use serde::Deserialize;

const FIXTURE_SUFFIX: &str = ".test.html";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning's span must start on this 1-based line of the
    /// normalized HTML.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    #[serde(default)]
    pub description: Option<String>,

    /// Run the linkify pass after conversion.
    #[serde(default)]
    pub linkify: bool,

    /// Turn anchors into link marks (the default) or keep their text only.
    #[serde(default = "default_anchor_links")]
    pub anchor_links: bool,

    /// Number of blocks in the document.
    #[serde(default)]
    pub expect_blocks: Option<usize>,

    /// Text of each block.
    #[serde(default)]
    pub expect_text: Option<Vec<String>>,

    /// Style of each block: `normal`, `h1`..`h6`, or `bullet`/`number` for list items.
    #[serde(default)]
    pub expect_styles: Option<Vec<String>>,

    /// Link definition targets, block by block.
    #[serde(default)]
    pub expect_links: Option<Vec<String>>,

    /// Markdown rendering (trimmed comparison).
    #[serde(default)]
    pub expect_markdown: Option<String>,

    /// If present (even empty), warning count and content are checked.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,
}

fn default_anchor_links() -> bool {
    true
}

/// Split a fixture into its TOML config and HTML body.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..];
    let html = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, html))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.trim_end_matches(FIXTURE_SUFFIX))
                .unwrap_or("?")
        })
    }
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let (config, html) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };
    let description = config.description.clone();

    let options = ConvertOptions {
        anchors: if config.anchor_links {
            AnchorPolicy::Link
        } else {
            AnchorPolicy::TextOnly
        },
    };
    let conversion = Converter::new(html, 0)
        .with_options(options)
        .convert_with_warnings();

    let document = if config.linkify {
        linkify::linkify(conversion.document)
    } else {
        conversion.document
    };

    let checks = [
        check_document(&config, &document),
        config
            .expect_warnings
            .as_ref()
            .and_then(|expected| check_warnings(&conversion.normalized, &conversion.warnings, expected)),
    ];

    match checks.into_iter().flatten().next() {
        Some(reason) => fail(description, reason),
        None => TestResult {
            path: path.to_path_buf(),
            description,
            outcome: TestOutcome::Pass,
        },
    }
}

/// Compare the document against the `expect_*` keys. Returns `Some(reason)` on mismatch.
fn check_document(config: &TestConfig, document: &Document) -> Option<String> {
    if let Some(expected) = config.expect_blocks {
        if document.len() != expected {
            return Some(format!(
                "expected {} block(s), got {}\n  texts: {:?}",
                expected,
                document.len(),
                block_texts(document)
            ));
        }
    }

    if let Some(expected) = &config.expect_text {
        let actual = block_texts(document);
        if &actual != expected {
            return Some(mismatch("block text", expected, &actual));
        }
    }

    if let Some(expected) = &config.expect_styles {
        let actual: Vec<String> = document
            .blocks()
            .iter()
            .map(|block| match block.list {
                Some(list) => list.kind.name().to_string(),
                None => block.style.name(),
            })
            .collect();
        if &actual != expected {
            return Some(mismatch("block styles", expected, &actual));
        }
    }

    if let Some(expected) = &config.expect_links {
        let actual: Vec<String> = document
            .blocks()
            .iter()
            .flat_map(|block| block.marks.iter().map(|def| def.href.clone()))
            .collect();
        if &actual != expected {
            return Some(mismatch("links", expected, &actual));
        }
    }

    if let Some(expected) = &config.expect_markdown {
        let actual = document.to_string();
        if actual.trim() != expected.trim() {
            return Some(format!(
                "markdown mismatch\n  expected: {:?}\n  actual:   {:?}",
                expected.trim(),
                actual.trim()
            ));
        }
    }

    None
}

fn block_texts(document: &Document) -> Vec<String> {
    document.blocks().iter().map(|block| block.text()).collect()
}

fn mismatch(what: &str, expected: &[String], actual: &[String]) -> String {
    format!(
        "{} mismatch\n  expected: {:?}\n  actual:   {:?}",
        what, expected, actual
    )
}

/// Convert a byte offset in `source` to a 1-based line number.
fn byte_offset_to_line(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

/// Check that actual warnings match expectations. Returns `Some(reason)` on mismatch.
fn check_warnings(
    normalized: &str,
    warnings: &[ConversionWarning],
    expected: &[ExpectedWarning],
) -> Option<String> {
    if warnings.len() != expected.len() {
        let actual: Vec<String> = warnings.iter().map(|w| format!("  - {}", w)).collect();
        return Some(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            warnings.len(),
            if actual.is_empty() {
                "    (none)".to_string()
            } else {
                actual.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in warnings.iter().zip(expected).enumerate() {
        if !actual.message.contains(&expected.contains) {
            return Some(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, actual.message
            ));
        }

        if let Some(expected_line) = expected.line {
            let actual_line = byte_offset_to_line(normalized, actual.span.start);
            if actual_line != expected_line {
                return Some(format!(
                    "warning[{}]: expected on line {}, but span is on line {}",
                    i, expected_line, actual_line
                ));
            }
        }
    }

    None
}

/// Fixtures grouped by category (subfolder relative to root), sorted.
/// Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
            continue;
        }
        let is_fixture = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(FIXTURE_SUFFIX));
        if is_fixture {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
        return;
    }

    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

/// Keep the requested categories and their subcategories.
fn select_categories(
    all: BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<String, Vec<PathBuf>> {
    if requested.is_empty() {
        return all;
    }

    for request in requested {
        let request = request.trim_matches('/');
        if !all.keys().any(|cat| in_category(cat, request)) {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                request,
                all.keys()
                    .map(|k| category_label(k))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }

    all.into_iter()
        .filter(|(cat, _)| {
            requested
                .iter()
                .any(|request| in_category(cat, request.trim_matches('/')))
        })
        .collect()
}

fn in_category(category: &str, request: &str) -> bool {
    category == request
        || category
            .strip_prefix(request)
            .is_some_and(|rest| rest.starts_with('/'))
}

struct Style {
    no_color: bool,
}

impl Style {
    fn paint(&self, text: &str, code: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        }
    }

    fn pass(&self) -> String {
        self.paint("PASS", "32")
    }

    fn fail(&self) -> String {
        self.paint("FAIL", "31")
    }

    fn bold(&self, text: &str) -> String {
        self.paint(text, "1")
    }
}

/// Run every fixture under `path` (or a single file).
/// If `categories` is non-empty, only run fixtures in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let style = Style { no_color };

    let selected = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        let all = discover_categorized(path);
        if all.is_empty() {
            eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
            return 1;
        }
        let selected = select_categories(all, categories);
        if selected.is_empty() {
            eprintln!("no matching categories found");
            return 1;
        }
        selected
    };
    let show_headers = !path.is_file();

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (category, files) in &selected {
        if show_headers {
            eprintln!();
            eprintln!("{}", style.bold(category_label(category)));
        }

        for file in files {
            let result = run_single_test(file);
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", style.pass(), result.label());
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", style.fail(), result.label());
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for failure in &failures {
            eprintln!();
            eprintln!("  --- {} ---", failure.path.display());
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    if failures.is_empty() {
        eprintln!("test result: {}. {} passed, 0 failed", style.paint("ok", "32"), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            style.paint("FAILED", "31"),
            passed,
            failures.len(),
            passed + failures.len()
        );
        1
    }
}
