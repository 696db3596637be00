use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::parser::entity::without_tags;

// ---------------------------------------------------------------------------
// Raw blocks
// ---------------------------------------------------------------------------

/// The kind of a top-level block candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawBlockKind {
    Heading(u8),
    /// `<p>`, `<div>` and `<blockquote>`.
    Paragraph,
    Preformatted,
    UnorderedList,
    OrderedList,
    /// Text outside any recognized block element.
    Loose,
}

/// A top-level block candidate. Ranges index the normalized HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    pub kind: RawBlockKind,
    /// The whole candidate, wrapper tags included.
    pub span: Range<usize>,
    /// Markup between the wrapper tags.
    pub inner: Range<usize>,
}

static BLOCK_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(/?)(h[1-6]|p|div|blockquote|pre|ul|ol)\b[^>]*>")
        .expect("BLOCK_TAG_RE: hardcoded regex is valid")
});

static LIST_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(/?)(li|ul|ol)\b[^>]*>").expect("LIST_TAG_RE: hardcoded regex is valid")
});

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Split normalized HTML into ordered top-level block candidates.
///
/// Opening tags of headings, paragraphs, divs, blockquotes, `pre` and lists are
/// split points. A list is kept whole up to its matching close tag, so nested
/// blocks inside list items never become blocks of their own. Untagged text
/// between blocks is kept as `Loose` content; whitespace-only fragments are
/// dropped.
pub fn segment(html: &str) -> Vec<RawBlock> {
    let mut blocks = Vec::new();
    let mut fragment_start = 0;
    let mut list_depth = 0usize;

    for caps in BLOCK_TAG_RE.captures_iter(html) {
        let Some(tag) = caps.get(0) else {
            continue;
        };
        let closing = !caps[1].is_empty();
        let is_list = is_list_tag(&caps[2]);

        if list_depth > 0 {
            if is_list {
                if closing {
                    list_depth -= 1;
                    if list_depth == 0 {
                        classify_fragment(html, fragment_start..tag.end(), &mut blocks);
                        fragment_start = tag.end();
                    }
                } else {
                    list_depth += 1;
                }
            }
            continue;
        }

        // Stray closing tags stay inside the current fragment
        if closing {
            continue;
        }

        classify_fragment(html, fragment_start..tag.start(), &mut blocks);
        fragment_start = tag.start();
        if is_list {
            list_depth = 1;
        }
    }

    classify_fragment(html, fragment_start..html.len(), &mut blocks);
    blocks
}

/// Ranges of the top-level `<li>` items inside a list's inner markup.
///
/// An item runs from its opening tag to the matching `</li>`, or to the next
/// sibling `<li>` when the close tag is missing. Items of nested lists stay
/// part of their parent item.
pub fn list_items(html: &str, inner: Range<usize>) -> Vec<Range<usize>> {
    let base = inner.start;
    let markup = &html[inner];
    let mut items = Vec::new();
    let mut current: Option<usize> = None;
    let mut depth = 0usize;

    for caps in LIST_TAG_RE.captures_iter(markup) {
        let Some(tag) = caps.get(0) else {
            continue;
        };
        let closing = !caps[1].is_empty();
        let name = caps[2].to_ascii_lowercase();

        match (name.as_str(), closing) {
            ("ul" | "ol", false) => depth += 1,
            ("ul" | "ol", true) => depth = depth.saturating_sub(1),
            ("li", false) if depth == 0 => {
                if let Some(start) = current.take() {
                    items.push(base + start..base + tag.start());
                }
                current = Some(tag.end());
            }
            ("li", true) if depth == 0 => {
                if let Some(start) = current.take() {
                    items.push(base + start..base + tag.start());
                }
            }
            _ => {}
        }
    }

    if let Some(start) = current {
        items.push(base + start..base + markup.len());
    }

    items
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn is_list_tag(name: &str) -> bool {
    name.eq_ignore_ascii_case("ul") || name.eq_ignore_ascii_case("ol")
}

/// Classify one fragment and push the raw blocks it yields.
fn classify_fragment(html: &str, range: Range<usize>, out: &mut Vec<RawBlock>) {
    let Some(range) = trim_range(html, range) else {
        return;
    };
    let fragment = &html[range.clone()];

    let opening = BLOCK_TAG_RE
        .captures(fragment)
        .filter(|caps| caps.get(0).is_some_and(|m| m.start() == 0) && caps[1].is_empty());

    let Some(caps) = opening else {
        push_loose(html, range, out);
        return;
    };
    let Some(open) = caps.get(0) else {
        return;
    };
    let name = caps[2].to_ascii_lowercase();
    let kind = raw_kind(&name);

    let inner_start = range.start + open.end();
    let close = find_close(html, inner_start..range.end, &name);

    let (inner_end, span_end) = match &close {
        Some(close) => (close.start, close.end),
        None => (range.end, range.end),
    };

    out.push(RawBlock {
        kind,
        span: range.start..span_end,
        inner: inner_start..inner_end,
    });

    // Anything after the close tag is kept as loose text
    if span_end < range.end {
        if let Some(rest) = trim_range(html, span_end..range.end) {
            push_loose(html, rest, out);
        }
    }
}

fn raw_kind(name: &str) -> RawBlockKind {
    match name {
        "p" | "div" | "blockquote" => RawBlockKind::Paragraph,
        "pre" => RawBlockKind::Preformatted,
        "ul" => RawBlockKind::UnorderedList,
        "ol" => RawBlockKind::OrderedList,
        heading => {
            let level = heading[1..].parse::<u8>().unwrap_or(1);
            RawBlockKind::Heading(level)
        }
    }
}

/// Find the close tag matching an element opened just before `range`.
///
/// Headings close on any `</hN>`. Lists track ul/ol nesting.
fn find_close(html: &str, range: Range<usize>, name: &str) -> Option<Range<usize>> {
    let base = range.start;
    let markup = &html[range];
    let heading = name.starts_with('h');
    let list = is_list_tag(name);
    let mut depth = 1usize;

    for caps in BLOCK_TAG_RE.captures_iter(markup) {
        let tag = caps.get(0)?;
        let closing = !caps[1].is_empty();
        let tag_name = caps[2].to_ascii_lowercase();

        let same = if heading {
            tag_name.starts_with('h')
        } else if list {
            is_list_tag(&tag_name)
        } else {
            tag_name == name
        };
        if !same {
            continue;
        }

        if closing {
            depth -= 1;
            if depth == 0 {
                return Some(base + tag.start()..base + tag.end());
            }
        } else if list {
            depth += 1;
        }
    }

    None
}

fn push_loose(html: &str, range: Range<usize>, out: &mut Vec<RawBlock>) {
    if without_tags(&html[range.clone()]).trim().is_empty() {
        return;
    }
    out.push(RawBlock {
        kind: RawBlockKind::Loose,
        span: range.clone(),
        inner: range,
    });
}

/// Shrink a range to exclude surrounding whitespace. None when nothing is left.
fn trim_range(html: &str, range: Range<usize>) -> Option<Range<usize>> {
    let text = &html[range.clone()];
    let start = range.start + (text.len() - text.trim_start().len());
    let end = range.start + text.trim_end().len();
    (start < end).then_some(start..end)
}
