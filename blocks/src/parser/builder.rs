use std::ops::Range;

use tracing::debug;

use crate::block::marks::MarkRegistry;
use crate::block::run::{Run, RunKey, StyleMark, StyleSet};
use crate::block::{Block, BlockKey, BlockStyle, ListInfo, ListKind};
use crate::parser::inline::{self, AnchorPolicy, InlineOptions, InlineRun};
use crate::parser::segment::{self, RawBlock, RawBlockKind};
use crate::parser::warning::ConversionWarning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edges {
    /// Trim leading whitespace of the first run and trailing of the last.
    Trim,
    /// Keep whitespace verbatim (preformatted text).
    Keep,
}

/// Turns raw block candidates into keyed blocks, in order.
///
/// Block keys count emitted blocks only, so dropped candidates leave no gaps.
pub(crate) struct DocumentBuilder<'a> {
    html: &'a str,
    file_id: usize,
    anchors: AnchorPolicy,
    blocks: Vec<Block>,
    warnings: Vec<ConversionWarning>,
}

impl<'a> DocumentBuilder<'a> {
    pub(crate) fn new(html: &'a str, file_id: usize, anchors: AnchorPolicy) -> Self {
        DocumentBuilder {
            html,
            file_id,
            anchors,
            blocks: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, raw: &RawBlock) {
        match raw.kind {
            RawBlockKind::Heading(level) => {
                let (runs, marks) = self.inline(raw.inner.clone(), StyleSet::EMPTY, Edges::Trim);
                if runs.is_empty() {
                    self.warn(format!("empty `<h{}>` heading dropped", level), raw.span.clone());
                    return;
                }
                self.emit(BlockStyle::Heading(level), None, runs, marks);
            }
            RawBlockKind::Paragraph | RawBlockKind::Loose => {
                let (runs, marks) = self.inline(raw.inner.clone(), StyleSet::EMPTY, Edges::Trim);
                if runs.is_empty() {
                    debug!(span = ?raw.span, "dropped empty paragraph");
                    return;
                }
                self.emit(BlockStyle::Normal, None, runs, marks);
            }
            RawBlockKind::Preformatted => {
                let code = StyleSet::EMPTY.with(StyleMark::Code);
                let (runs, marks) = self.inline(raw.inner.clone(), code, Edges::Keep);
                if runs.iter().all(|run| run.text.trim().is_empty()) {
                    debug!(span = ?raw.span, "dropped empty preformatted block");
                    return;
                }
                self.emit(BlockStyle::Normal, None, runs, marks);
            }
            RawBlockKind::UnorderedList => self.push_list(ListKind::Bullet, raw),
            RawBlockKind::OrderedList => self.push_list(ListKind::Number, raw),
        }
    }

    pub(crate) fn finish(self) -> (Vec<Block>, Vec<ConversionWarning>) {
        (self.blocks, self.warnings)
    }

    /// One block per top-level `<li>`; a list without items is dropped.
    fn push_list(&mut self, kind: ListKind, raw: &RawBlock) {
        let items = segment::list_items(self.html, raw.inner.clone());
        if items.is_empty() {
            self.warn("list without `<li>` items dropped", raw.span.clone());
            return;
        }

        for item in items {
            let (runs, marks) = self.inline(item, StyleSet::EMPTY, Edges::Trim);
            let list = ListInfo { kind, level: 1 };
            self.emit(BlockStyle::Normal, Some(list), runs, marks);
        }
    }

    fn inline(
        &mut self,
        inner: Range<usize>,
        base_styles: StyleSet,
        edges: Edges,
    ) -> (Vec<InlineRun>, MarkRegistry) {
        let html = self.html;
        let options = InlineOptions {
            file_id: self.file_id,
            anchors: self.anchors,
            base_styles,
        };

        let mut marks = MarkRegistry::new();
        let tokenized = inline::tokenize(&html[inner.clone()], inner.start, options, &mut marks);
        self.warnings.extend(tokenized.warnings);

        let mut runs = tokenized.runs;
        if edges == Edges::Trim {
            trim_edges(&mut runs);
        }
        (runs, marks)
    }

    fn emit(
        &mut self,
        style: BlockStyle,
        list: Option<ListInfo>,
        runs: Vec<InlineRun>,
        mut marks: MarkRegistry,
    ) {
        let index = self.blocks.len();

        let runs: Vec<Run> = if runs.is_empty() {
            vec![Run::new(RunKey::numbered(index, 0), "")]
        } else {
            runs.into_iter()
                .enumerate()
                .map(|(i, run)| Run {
                    key: RunKey::numbered(index, i),
                    text: run.text,
                    styles: run.styles,
                    link: run.link,
                })
                .collect()
        };

        // Anchors whose text was trimmed away leave unused definitions
        marks.retain(|def| runs.iter().any(|run| run.link.as_ref() == Some(&def.key)));

        self.blocks.push(Block {
            key: BlockKey::numbered(index),
            style,
            list,
            marks,
            runs,
        });
    }

    fn warn(&mut self, message: impl Into<String>, span: Range<usize>) {
        self.warnings
            .push(ConversionWarning::new(message, span, self.file_id));
    }
}

/// Trim whitespace at the outer edges of a block, removing runs left empty.
fn trim_edges(runs: &mut Vec<InlineRun>) {
    while let Some(first) = runs.first_mut() {
        let lead = first.text.len() - first.text.trim_start().len();
        if lead == first.text.len() {
            runs.remove(0);
            continue;
        }
        first.text.drain(..lead);
        break;
    }

    while let Some(last) = runs.last_mut() {
        let keep = last.text.trim_end().len();
        if keep == 0 {
            runs.pop();
            continue;
        }
        last.text.truncate(keep);
        break;
    }
}
