use blocks::{Block, Document, StyleMark, convert};
use linkify::{find_links, is_valid_url, linkify, linkify_block, linkify_with_report, normalize_url, trim_candidate};
use serde_json::json;

fn run_texts(block: &Block) -> Vec<&str> {
    block.runs.iter().map(|run| run.text.as_str()).collect()
}

fn linked(block: &Block) -> Vec<(&str, &str)> {
    block
        .runs
        .iter()
        .filter_map(|run| Some((run.text.as_str(), block.link_href(run)?)))
        .collect()
}

fn found<'a>(text: &'a str) -> Vec<&'a str> {
    find_links(text).into_iter().map(|range| &text[range]).collect()
}

#[test]
fn bare_domain_becomes_link() {
    let document = linkify(convert("<p>Visit example.com today</p>"));
    let block = &document.blocks()[0];
    assert_eq!(run_texts(block), vec!["Visit ", "example.com", " today"]);
    assert_eq!(linked(block), vec![("example.com", "https://example.com")]);
    assert_eq!(block.marks.len(), 1);
}

#[test]
fn trailing_punctuation_stays_plain() {
    let document = linkify(convert("<p>See https://rust-lang.org/learn.</p>"));
    let block = &document.blocks()[0];
    assert_eq!(run_texts(block), vec!["See ", "https://rust-lang.org/learn", "."]);
    assert_eq!(
        linked(block),
        vec![("https://rust-lang.org/learn", "https://rust-lang.org/learn")]
    );
}

#[test]
fn unbalanced_parenthesis_stays_plain() {
    let document = linkify(convert("<p>(see example.com)</p>"));
    assert_eq!(run_texts(&document.blocks()[0]), vec!["(see ", "example.com", ")"]);
}

#[test]
fn same_target_shares_one_definition() {
    let document = linkify(convert("<p>example.com and <b>example.com</b></p>"));
    let block = &document.blocks()[0];
    assert_eq!(block.marks.len(), 1);

    let keys: Vec<_> = block.runs.iter().filter_map(|run| run.link.clone()).collect();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0], keys[1]);
}

#[test]
fn existing_definition_is_reused() {
    let html = "<p><a href=\"https://example.com\">site</a> or example.com</p>";
    let (document, report) = linkify_with_report(convert(html));
    let block = &document.blocks()[0];
    assert_eq!(block.marks.len(), 1);
    assert_eq!(report.links_created, 1);
    assert_eq!(report.definitions_added, 0);
    assert_eq!(block.runs[0].link, block.runs[2].link);
}

#[test]
fn abbreviations_and_ellipses_are_not_links() {
    assert!(find_links("see e.g. the chart...").is_empty());
    assert!(find_links("and so on, etc. and i.e. this").is_empty());
    assert!(find_links("version 1.5 released, up 2.75x").is_empty());
    assert!(find_links("wait... what").is_empty());
}

#[test]
fn email_addresses_are_not_links() {
    assert!(find_links("write to me@example.com").is_empty());
    assert_eq!(found("mail me@example.com or visit rust-lang.org"), vec!["rust-lang.org"]);
}

#[test]
fn several_urls_in_one_run() {
    assert_eq!(
        found("Try www.example.org, docs.rs/regex and HTTPS://crates.io!"),
        vec!["www.example.org", "docs.rs/regex", "HTTPS://crates.io"]
    );
}

#[test]
fn candidate_trimming() {
    assert_eq!(trim_candidate("example.com."), "example.com");
    assert_eq!(trim_candidate("example.com/page);"), "example.com/page");
    assert_eq!(
        trim_candidate("en.wikipedia.org/wiki/Rust_(language)"),
        "en.wikipedia.org/wiki/Rust_(language)"
    );
}

#[test]
fn validity_rules() {
    assert!(is_valid_url("example.com"));
    assert!(is_valid_url("https://blog.example.com/posts/1"));
    assert!(!is_valid_url(".htaccess"));
    assert!(!is_valid_url("example.com."));
    assert!(!is_valid_url("a.b"));
    assert!(!is_valid_url("vs.net"));
    assert!(!is_valid_url("3.14.com"));
    assert!(!is_valid_url("x.y.z"));
    assert!(is_valid_url("https://me@example.com"));
}

#[test]
fn url_normalization() {
    assert_eq!(normalize_url("Example.com."), "https://Example.com");
    assert_eq!(normalize_url("HTTP://x.org/a"), "HTTP://x.org/a");
    assert_eq!(normalize_url("  www.a.io; "), "https://www.a.io");
    assert_eq!(normalize_url("http://x.org?"), "http://x.org");
}

#[test]
fn styles_are_preserved() {
    let document = linkify(convert("<p><em>go to www.example.org now</em></p>"));
    let block = &document.blocks()[0];
    assert_eq!(block.runs.len(), 3);
    assert!(block.runs.iter().all(|run| run.styles.contains(StyleMark::Emphasis)));
    assert_eq!(linked(block), vec![("www.example.org", "https://www.example.org")]);
}

#[test]
fn linked_runs_are_skipped() {
    let (document, report) =
        linkify_with_report(convert("<p><a href=\"https://x.org\">example.com</a></p>"));
    let block = &document.blocks()[0];
    assert_eq!(block.runs.len(), 1);
    assert_eq!(block.link_href(&block.runs[0]), Some("https://x.org"));
    assert_eq!(report.blocks_scanned, 1);
    assert_eq!(report.blocks_modified, 0);
}

#[test]
fn sub_run_keys_avoid_collisions() {
    let mut block: Block = serde_json::from_value(json!({
        "id": "b",
        "children": [
            { "key": "s", "text": "see go.dev or rust-lang.org" },
            { "key": "s-1", "text": " plain" }
        ]
    }))
    .expect("block");

    let report = linkify_block(&mut block);
    assert_eq!(report.links_created, 2);
    assert_eq!(report.definitions_added, 2);

    let keys: Vec<&str> = block.runs.iter().map(|run| run.key.as_str()).collect();
    assert_eq!(keys, vec!["s-0", "s-2", "s-3", "s-4", "s-1"]);
    assert_eq!(run_texts(&block), vec!["see ", "go.dev", " or ", "rust-lang.org", " plain"]);
}

#[test]
fn text_is_preserved() {
    let html = "<p>a example.com, b (www.x.org) c</p><ul><li>docs.rs. e.g. no</li></ul><p>me@site.org 1.5 x.y</p>";
    let before = convert(html);
    let after = linkify(before.clone());
    assert_eq!(before.len(), after.len());
    for (old, new) in before.blocks().iter().zip(after.blocks()) {
        assert_eq!(old.text(), new.text());
    }
}

#[test]
fn second_pass_changes_nothing() {
    let html = "<p>Read example.com/a. Then <b>www.rust-lang.org</b>!</p>\
                <p>mail me@example.com or see e.g.example.com and 1.5.example.org</p>\
                <p><a href=\"https://a.io\">a.io</a> and a.io/x</p>";
    let once = linkify(convert(html));
    let twice = linkify(once.clone());
    assert_eq!(once, twice);

    let (_, report) = linkify_with_report(once);
    assert_eq!(report.blocks_modified, 0);
    assert_eq!(report.links_created, 0);
}

#[test]
fn report_counts_blocks() {
    let (_, report) =
        linkify_with_report(convert("<p>nothing here</p><p>one crates.io two docs.rs</p>"));
    assert_eq!(report.blocks_scanned, 2);
    assert_eq!(report.blocks_modified, 1);
    assert_eq!(report.links_created, 2);
    assert_eq!(report.definitions_added, 2);
}

#[test]
fn placeholder_document_is_untouched() {
    let document = linkify(Document::placeholder());
    assert_eq!(document, Document::placeholder());
}
