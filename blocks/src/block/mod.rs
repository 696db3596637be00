/// Declares a string-backed identifier newtype.
///
/// Keys from a content store are arbitrary strings, keys produced by the
/// converter follow a numbered scheme; both share one type.
macro_rules! string_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            pub fn new(key: impl Into<String>) -> Self {
                $name(key.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                $name(key.to_string())
            }
        }
    };
}

pub mod marks;
pub mod run;

use std::fmt;

use crate::block::marks::MarkRegistry;
use crate::block::run::{Run, RunKey};

string_key! {
    /// Identifier of a block, unique within its document.
    BlockKey
}

impl BlockKey {
    /// The key the converter assigns to the `index`-th emitted block.
    pub fn numbered(index: usize) -> Self {
        BlockKey(format!("block-{}", index))
    }
}

/// Paragraph style of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockStyle {
    #[default]
    Normal,
    /// Heading level 1..=6.
    Heading(u8),
}

impl BlockStyle {
    pub fn name(&self) -> String {
        match self {
            BlockStyle::Normal => "normal".to_string(),
            BlockStyle::Heading(level) => format!("h{}", level),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "normal" => Some(BlockStyle::Normal),
            _ => {
                let level = name.strip_prefix('h')?.parse::<u8>().ok()?;
                (1..=6).contains(&level).then_some(BlockStyle::Heading(level))
            }
        }
    }
}

impl fmt::Display for BlockStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Bullet,
    Number,
}

impl ListKind {
    pub fn name(self) -> &'static str {
        match self {
            ListKind::Bullet => "bullet",
            ListKind::Number => "number",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bullet" => Some(ListKind::Bullet),
            "number" => Some(ListKind::Number),
            _ => None,
        }
    }
}

/// List membership of a block that came from a list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListInfo {
    pub kind: ListKind,
    /// Nesting level, 1 for top-level items.
    pub level: u8,
}

/// One structural unit of a document: a paragraph, a heading, or a list item.
///
/// Link annotations are defined once in the block's `marks` registry and
/// referenced by key from its runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub key: BlockKey,
    pub style: BlockStyle,
    pub list: Option<ListInfo>,
    pub marks: MarkRegistry,
    pub runs: Vec<Run>,
}

impl Block {
    /// A normal block holding a single empty run.
    pub fn empty(key: BlockKey, run_key: RunKey) -> Self {
        Block {
            key,
            style: BlockStyle::Normal,
            list: None,
            marks: MarkRegistry::new(),
            runs: vec![Run::new(run_key, "")],
        }
    }

    /// Concatenated text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    /// True when no run carries any non-whitespace text.
    pub fn is_blank(&self) -> bool {
        self.runs.iter().all(|run| run.text.trim().is_empty())
    }

    /// Resolve a run's link reference against this block's registry.
    pub fn link_href(&self, run: &Run) -> Option<&str> {
        let key = run.link.as_ref()?;
        self.marks.get(key).map(|def| def.href.as_str())
    }
}
