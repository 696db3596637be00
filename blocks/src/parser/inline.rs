use std::mem;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::block::marks::{MarkKey, MarkRegistry};
use crate::block::run::{StyleMark, StyleSet};
use crate::parser::warning::ConversionWarning;

static INLINE_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<(/?)([a-zA-Z][a-zA-Z0-9]*)([^>]*)>")
        .expect("INLINE_TAG_RE: hardcoded regex is valid")
});

static HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("HREF_RE: hardcoded regex is valid")
});

/// What to do with `<a href="...">` anchors found in inline markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorPolicy {
    /// Register the href as a block link mark and reference it from the anchor text.
    #[default]
    Link,
    /// Keep the anchor text only.
    TextOnly,
}

/// Settings shared by every tokenizer call of one conversion.
#[derive(Debug, Clone, Copy)]
pub struct InlineOptions {
    pub file_id: usize,
    pub anchors: AnchorPolicy,
    /// Styles applied to every run regardless of tags (`Code` for `<pre>`).
    pub base_styles: StyleSet,
}

/// A run before keys are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineRun {
    pub text: String,
    pub styles: StyleSet,
    pub link: Option<MarkKey>,
}

#[derive(Debug, Clone)]
pub struct Tokenized {
    /// Non-empty runs; no two neighbours share the same annotations.
    pub runs: Vec<InlineRun>,
    pub warnings: Vec<ConversionWarning>,
}

/// Walk a block's inner markup and produce annotated text runs.
///
/// `offset` is the position of `inner` in the normalized HTML, used for
/// warning spans. Anchor targets are interned into `registry`.
pub fn tokenize(
    inner: &str,
    offset: usize,
    options: InlineOptions,
    registry: &mut MarkRegistry,
) -> Tokenized {
    let mut state = TokenizerState::new(offset, options, registry);
    let mut last = 0;

    for caps in INLINE_TAG_RE.captures_iter(inner) {
        let Some(token) = caps.get(0) else {
            continue;
        };
        state.text(&inner[last..token.start()]);
        last = token.end();

        // Comments have no tag name
        let Some(name) = caps.get(2) else {
            continue;
        };
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let attrs = caps.get(3).map_or("", |m| m.as_str());
        let span = offset + token.start()..offset + token.end();
        state.tag(&name.as_str().to_ascii_lowercase(), closing, attrs, span);
    }
    state.text(&inner[last..]);

    state.finish()
}

// ---------------------------------------------------------------------------
// Mark stack
// ---------------------------------------------------------------------------

/// An open style tag: the style, the tag name as written, and its span.
struct OpenMark {
    mark: StyleMark,
    tag: String,
    span: Range<usize>,
}

/// Ordered record of the style marks open at the current position.
///
/// Marks form a set: opening an already-open style is ignored, and closing
/// removes it regardless of what was opened after it.
#[derive(Default)]
struct MarkStack {
    open: Vec<OpenMark>,
}

impl MarkStack {
    /// Returns false when the style was already open.
    fn push(&mut self, mark: StyleMark, tag: &str, span: Range<usize>) -> bool {
        if self.open.iter().any(|open| open.mark == mark) {
            return false;
        }
        self.open.push(OpenMark {
            mark,
            tag: tag.to_string(),
            span,
        });
        true
    }

    /// Returns false when the style was not open.
    fn remove(&mut self, mark: StyleMark) -> bool {
        match self.open.iter().rposition(|open| open.mark == mark) {
            Some(index) => {
                self.open.remove(index);
                true
            }
            None => false,
        }
    }

    fn active(&self) -> StyleSet {
        self.open.iter().map(|open| open.mark).collect()
    }
}

// ---------------------------------------------------------------------------
// Tokenizer state
// ---------------------------------------------------------------------------

enum InlineTag {
    Style(StyleMark),
    Break,
    ListItem,
    /// Block-level markup nested in a block that is itself being tokenized.
    Boundary,
    Anchor,
    Other,
}

fn classify(name: &str) -> InlineTag {
    match name {
        "strong" | "b" => InlineTag::Style(StyleMark::Strong),
        "em" | "i" => InlineTag::Style(StyleMark::Emphasis),
        "code" => InlineTag::Style(StyleMark::Code),
        "br" => InlineTag::Break,
        "li" => InlineTag::ListItem,
        "p" | "div" | "blockquote" | "pre" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            InlineTag::Boundary
        }
        "a" => InlineTag::Anchor,
        _ => InlineTag::Other,
    }
}

struct TokenizerState<'r> {
    offset: usize,
    options: InlineOptions,
    registry: &'r mut MarkRegistry,
    stack: MarkStack,
    link: Option<MarkKey>,
    buffer: String,
    runs: Vec<InlineRun>,
    warnings: Vec<ConversionWarning>,
}

impl<'r> TokenizerState<'r> {
    fn new(offset: usize, options: InlineOptions, registry: &'r mut MarkRegistry) -> Self {
        TokenizerState {
            offset,
            options,
            registry,
            stack: MarkStack::default(),
            link: None,
            buffer: String::new(),
            runs: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn text(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn tag(&mut self, name: &str, closing: bool, attrs: &str, span: Range<usize>) {
        match classify(name) {
            InlineTag::Style(mark) => {
                // The buffered text belongs to the marks active before this tag,
                // including the one a closing tag is about to remove.
                self.flush();
                if closing {
                    if !self.stack.remove(mark) {
                        self.warn(
                            format!("closing `</{}>` tag without matching opening tag", name),
                            span,
                        );
                    }
                } else {
                    self.stack.push(mark, name, span);
                }
            }
            // Line breaks are content, not run boundaries
            InlineTag::Break => self.buffer.push('\n'),
            InlineTag::ListItem if !closing => self.line_boundary(),
            InlineTag::Boundary => self.line_boundary(),
            InlineTag::Anchor => {
                if self.options.anchors == AnchorPolicy::TextOnly {
                    return;
                }
                self.flush();
                self.link = if closing {
                    None
                } else {
                    self.anchor_link(attrs, span)
                };
            }
            InlineTag::ListItem | InlineTag::Other => {}
        }
    }

    /// Separate flattened content with a single newline, never at the start.
    fn line_boundary(&mut self) {
        let at_line_start = match self.buffer.chars().next_back() {
            Some(last) => last == '\n',
            None => self.runs.last().is_none_or(|run| run.text.ends_with('\n')),
        };
        if !at_line_start {
            self.buffer.push('\n');
        }
    }

    fn anchor_link(&mut self, attrs: &str, span: Range<usize>) -> Option<MarkKey> {
        let href = HREF_RE.captures(attrs).and_then(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().trim().to_string())
        });

        match href {
            Some(href) if is_linkable(&href) => Some(self.registry.intern_link(&href).0),
            Some(_) => None,
            None => {
                self.warn("anchor without `href`; text kept without a link", span);
                None
            }
        }
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let run = InlineRun {
            text: mem::take(&mut self.buffer),
            styles: self.stack.active().union(self.options.base_styles),
            link: self.link.clone(),
        };

        if let Some(last) = self.runs.last_mut() {
            if last.styles == run.styles && last.link == run.link {
                last.text.push_str(&run.text);
                return;
            }
        }
        self.runs.push(run);
    }

    fn warn(&mut self, message: impl Into<String>, span: Range<usize>) {
        self.warnings
            .push(ConversionWarning::new(message, span, self.options.file_id));
    }

    fn finish(mut self) -> Tokenized {
        self.flush();

        // Styles left open at the end are dropped
        for open in mem::take(&mut self.stack.open) {
            let warning = ConversionWarning::new(
                format!("unclosed `<{}>` tag", open.tag),
                open.span,
                self.options.file_id,
            )
            .with_note(format!(
                "`{}` applies up to the end of the enclosing block",
                open.mark.name()
            ));
            self.warnings.push(warning);
        }

        tracing::trace!(
            offset = self.offset,
            runs = self.runs.len(),
            "tokenized inline markup"
        );

        Tokenized {
            runs: self.runs,
            warnings: self.warnings,
        }
    }
}

/// Anchors pointing nowhere (`#…`, `javascript:`, empty) carry no link.
fn is_linkable(href: &str) -> bool {
    !href.is_empty()
        && !href.starts_with('#')
        && !href.to_ascii_lowercase().starts_with("javascript:")
}
