use blocks::parser::{decode_entities, normalize, strip_tags};
use blocks::{Block, Document, MarkKey, StyleMark, convert};
use serde_json::json;

#[test]
fn entity_decoding_happens_once() {
    assert_eq!(normalize("A &amp;amp; B"), "A &amp; B");
    assert_eq!(normalize("x&nbsp;y &unknown;"), "x y &unknown;");
    assert_eq!(normalize("a\r\nb\rc"), "a\nb\nc");
}

#[test]
fn plain_string_helpers() {
    assert_eq!(decode_entities("Wait&#8230; what&#8203;"), "Wait\u{2026} what");
    assert_eq!(strip_tags("  <p>Short <b>excerpt</b> &amp; more</p>\n"), "Short excerpt & more");
}

#[test]
fn document_serializes_as_block_records() {
    let document = convert("<h2>Hi</h2><ul><li><a href=\"https://a.io\"><b>go</b></a></li></ul>");
    let value = serde_json::to_value(&document).expect("serialize");

    assert_eq!(
        value,
        json!([
            {
                "id": "block-0",
                "style": "h2",
                "markDefs": [],
                "children": [{ "key": "span-0-0", "text": "Hi", "marks": [] }]
            },
            {
                "id": "block-1",
                "style": "normal",
                "listItem": "bullet",
                "level": 1,
                "markDefs": [{ "key": "link-0", "type": "link", "href": "https://a.io" }],
                "children": [{ "key": "span-1-0", "text": "go", "marks": ["strong", "link-0"] }]
            }
        ])
    );
}

#[test]
fn records_round_trip() {
    let document = convert(
        "<p>a <em>b</em> <a href=\"https://x.org/\">c</a></p><ol><li>one</li></ol><pre>x  y</pre>",
    );
    let json = serde_json::to_string(&document).expect("serialize");
    let back: Document = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, document);
}

#[test]
fn content_store_spellings_are_accepted() {
    let input = json!([{
        "_key": "abc",
        "_type": "block",
        "style": "normal",
        "markDefs": [{ "_key": "l1", "_type": "link", "href": "https://example.com" }],
        "children": [
            { "_key": "s1", "_type": "span", "text": "see ", "marks": [] },
            { "_key": "s2", "_type": "span", "text": "here", "marks": ["em", "l1"] }
        ]
    }]);
    let document: Document = serde_json::from_value(input).expect("deserialize");
    let block = &document.blocks()[0];
    assert_eq!(block.key.as_str(), "abc");
    assert_eq!(block.runs[1].link, Some(MarkKey::from("l1")));
    assert!(block.runs[1].styles.contains(StyleMark::Emphasis));
    assert_eq!(block.link_href(&block.runs[1]), Some("https://example.com"));
}

#[test]
fn missing_optional_fields_use_defaults() {
    let block: Block =
        serde_json::from_value(json!({ "id": "b", "children": [{ "key": "s" }] })).expect("deserialize");
    assert_eq!(block.style.name(), "normal");
    assert!(block.list.is_none());
    assert_eq!(block.runs[0].text, "");
}

#[test]
fn invalid_records_are_rejected() {
    let unknown_mark = json!({
        "id": "b",
        "children": [{ "key": "s", "text": "x", "marks": ["underline"] }]
    });
    let err = serde_json::from_value::<Block>(unknown_mark).unwrap_err();
    assert!(err.to_string().contains("underline"));

    let two_links = json!({
        "id": "b",
        "markDefs": [
            { "key": "l0", "type": "link", "href": "https://a.io" },
            { "key": "l1", "type": "link", "href": "https://b.io" }
        ],
        "children": [{ "key": "s", "text": "x", "marks": ["l0", "l1"] }]
    });
    assert!(serde_json::from_value::<Block>(two_links).is_err());

    let bad_style = json!({ "id": "b", "style": "h7", "children": [] });
    assert!(serde_json::from_value::<Block>(bad_style).is_err());
}

#[test]
fn repeated_link_target_is_rejected() {
    let input = json!({
        "id": "b",
        "markDefs": [
            { "key": "l0", "type": "link", "href": "https://a.io" },
            { "key": "l1", "type": "link", "href": "https://a.io" }
        ],
        "children": [
            { "key": "s0", "text": "x", "marks": ["l0"] },
            { "key": "s1", "text": "y", "marks": ["l1"] }
        ]
    });
    let err = serde_json::from_value::<Block>(input).unwrap_err();
    assert!(err.to_string().contains("repeats link target `https://a.io`"));

    let repeated_key = json!({
        "id": "b",
        "markDefs": [
            { "key": "l0", "type": "link", "href": "https://a.io" },
            { "key": "l0", "type": "link", "href": "https://b.io" }
        ],
        "children": []
    });
    let err = serde_json::from_value::<Block>(repeated_key).unwrap_err();
    assert!(err.to_string().contains("duplicate mark definition key `l0`"));
}

#[test]
fn empty_array_deserializes_to_placeholder() {
    let document: Document = serde_json::from_str("[]").expect("deserialize");
    assert_eq!(document, Document::placeholder());
}
