use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Entity substitutions applied before structural parsing, in order.
/// `&amp;` must stay last so that `&amp;amp;` decodes to `&amp;` and no further.
const ENTITIES: &[(&str, &str)] = &[
    ("&#8211;", "\u{2013}"),
    ("&#8212;", "\u{2014}"),
    ("&#8220;", "\u{201C}"),
    ("&#8221;", "\u{201D}"),
    ("&#8216;", "\u{2018}"),
    ("&#8217;", "\u{2019}"),
    ("&nbsp;", " "),
    ("&hellip;", "..."),
    ("&quot;", "\""),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&amp;", "&"),
];

/// Extra substitutions for plain strings such as titles.
const TEXT_ENTITIES: &[(&str, &str)] = &[
    ("&#8230;", "\u{2026}"),
    ("&#8200;", ""),
    ("&#8203;", ""),
];

static DOUBLE_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>\s*<br\s*/?>").expect("DOUBLE_BREAK_RE: hardcoded regex is valid")
});

static PRE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<pre\b[^>]*>.*?</pre\s*>").expect("PRE_RE: hardcoded regex is valid")
});

static ANY_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("ANY_TAG_RE: hardcoded regex is valid"));

/// Prepare raw HTML for segmentation.
///
/// Decodes the fixed entity table, folds CRLF and CR into LF, and rewrites a
/// double `<br>` outside `<pre>` into a paragraph boundary. Unknown entities
/// pass through.
pub fn normalize(raw: &str) -> String {
    let text = substitute(raw, ENTITIES);
    let text = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for pre in PRE_RE.find_iter(&text) {
        out.push_str(&DOUBLE_BREAK_RE.replace_all(&text[last..pre.start()], "</p><p>"));
        out.push_str(pre.as_str());
        last = pre.end();
    }
    out.push_str(&DOUBLE_BREAK_RE.replace_all(&text[last..], "</p><p>"));
    out
}

/// Decode entities in a plain string (a title, an excerpt).
pub fn decode_entities(text: &str) -> String {
    let text = substitute(text, TEXT_ENTITIES);
    substitute(&text, ENTITIES)
}

/// Tag-free, entity-decoded, trimmed text of an HTML fragment.
pub fn strip_tags(html: &str) -> String {
    decode_entities(&without_tags(html)).trim().to_string()
}

/// Remove every `<...>` tag, keeping the text between them.
pub(crate) fn without_tags(html: &str) -> Cow<'_, str> {
    ANY_TAG_RE.replace_all(html, "")
}

fn substitute(text: &str, table: &[(&str, &str)]) -> String {
    let mut out = text.to_string();
    for &(entity, replacement) in table {
        if out.contains(entity) {
            out = out.replace(entity, replacement);
        }
    }
    out
}
