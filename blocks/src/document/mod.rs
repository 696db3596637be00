mod render;
pub mod serialize;

use crate::block::run::RunKey;
use crate::block::{Block, BlockKey};

/// A Document is the ordered sequence of blocks of one converted article body.
///
/// A document always holds at least one block: constructing one from an empty
/// sequence yields the placeholder block.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        if blocks.is_empty() {
            return Document::placeholder();
        }
        Document { blocks }
    }

    /// A document holding one normal block with one empty run.
    pub fn placeholder() -> Self {
        Document {
            blocks: vec![Block::empty(BlockKey::numbered(0), RunKey::numbered(0, 0))],
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Mutable access to the blocks. A slice, so the block count is fixed.
    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True when no block carries any non-whitespace text.
    pub fn is_blank(&self) -> bool {
        self.blocks.iter().all(Block::is_blank)
    }

    /// Text of every block, blocks separated by a blank line. No markup.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Short summary taken from the first block with text.
    ///
    /// Text longer than `max_chars` characters is cut at that many characters
    /// and suffixed with `...`.
    pub fn excerpt(&self, max_chars: usize) -> Option<String> {
        self.blocks.iter().find_map(|block| {
            let text = block.text();
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            if text.chars().count() > max_chars {
                let cut: String = text.chars().take(max_chars).collect();
                Some(format!("{}...", cut.trim_end()))
            } else {
                Some(text.to_string())
            }
        })
    }
}

impl From<Vec<Block>> for Document {
    fn from(blocks: Vec<Block>) -> Self {
        Document::new(blocks)
    }
}
