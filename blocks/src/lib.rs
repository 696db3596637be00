pub mod block;
pub mod document;
pub mod parser;

pub use crate::block::marks::{MarkDefinition, MarkKey, MarkKind, MarkRegistry};
pub use crate::block::run::{Run, RunKey, StyleMark, StyleSet};
pub use crate::block::{Block, BlockKey, BlockStyle, ListInfo, ListKind};
pub use crate::document::Document;

/// Convert an HTML fragment into a portable-blocks document with default options.
///
/// Never fails: malformed markup degrades to best-effort text, and empty input
/// yields a document holding a single empty block.
pub fn convert(html: &str) -> Document {
    parser::Converter::new(html, 0).convert()
}
