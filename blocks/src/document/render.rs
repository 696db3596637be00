use std::fmt;

use crate::block::run::{Run, StyleMark};
use crate::block::{Block, BlockStyle, ListKind};
use crate::document::Document;

/// Markdown-flavoured rendering: headings get `#` prefixes, list items `-` or
/// a running number, styles become `**`/`*`/backticks and links `[text](href)`.
///
/// Numbering restarts at 1 after any block that is not a numbered list item.
/// Blocks keep no record of which `<ol>` they came from, so two adjacent
/// ordered lists render as one continuous list.
impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut previous: Option<&Block> = None;
        let mut number = 0u64;

        for block in &self.blocks {
            if let Some(prev) = previous {
                // Consecutive list items stay on adjacent lines
                if prev.list.is_some() && block.list.is_some() {
                    writeln!(f)?;
                } else {
                    writeln!(f)?;
                    writeln!(f)?;
                }
            }

            let continues_numbering = previous
                .and_then(|prev| prev.list)
                .is_some_and(|list| list.kind == ListKind::Number);
            number = if continues_numbering { number + 1 } else { 1 };

            write_prefix(f, block, number)?;
            for run in &block.runs {
                write_run(f, block, run)?;
            }
            previous = Some(block);
        }

        writeln!(f)
    }
}

fn write_prefix(f: &mut fmt::Formatter<'_>, block: &Block, number: u64) -> fmt::Result {
    if let BlockStyle::Heading(level) = block.style {
        for _ in 0..level {
            write!(f, "#")?;
        }
        write!(f, " ")?;
    }
    if let Some(list) = block.list {
        for _ in 1..list.level {
            write!(f, "  ")?;
        }
        match list.kind {
            ListKind::Bullet => write!(f, "- ")?,
            ListKind::Number => write!(f, "{}. ", number)?,
        }
    }
    Ok(())
}

fn write_run(f: &mut fmt::Formatter<'_>, block: &Block, run: &Run) -> fmt::Result {
    if run.text.is_empty() {
        return Ok(());
    }

    let mut text = run.text.clone();
    if run.styles.contains(StyleMark::Code) {
        text = format!("`{}`", text);
    }
    if run.styles.contains(StyleMark::Emphasis) {
        text = format!("*{}*", text);
    }
    if run.styles.contains(StyleMark::Strong) {
        text = format!("**{}**", text);
    }
    match block.link_href(run) {
        Some(href) => write!(f, "[{}]({})", text, href),
        None => write!(f, "{}", text),
    }
}
