use crate::block::marks::MarkKey;

string_key! {
    /// Identifier of a run, unique within its block.
    RunKey
}

impl RunKey {
    /// The key the converter assigns to run `run` of block `block`.
    pub fn numbered(block: usize, run: usize) -> Self {
        RunKey(format!("span-{}-{}", block, run))
    }
}

/// A character style annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StyleMark {
    Strong,
    Emphasis,
    Code,
}

impl StyleMark {
    /// All styles, in serialization order.
    pub const ALL: [StyleMark; 3] = [StyleMark::Strong, StyleMark::Emphasis, StyleMark::Code];

    pub fn name(self) -> &'static str {
        match self {
            StyleMark::Strong => "strong",
            StyleMark::Emphasis => "em",
            StyleMark::Code => "code",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "strong" => Some(StyleMark::Strong),
            "em" => Some(StyleMark::Emphasis),
            "code" => Some(StyleMark::Code),
            _ => None,
        }
    }

    fn bit(self) -> u8 {
        match self {
            StyleMark::Strong => 0b001,
            StyleMark::Emphasis => 0b010,
            StyleMark::Code => 0b100,
        }
    }
}

/// A set of style marks. Marks are a set, not a count: inserting an already
/// present mark is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StyleSet(u8);

impl StyleSet {
    pub const EMPTY: StyleSet = StyleSet(0);

    pub fn with(mut self, mark: StyleMark) -> Self {
        self.insert(mark);
        self
    }

    /// Returns false if the mark was already present.
    pub fn insert(&mut self, mark: StyleMark) -> bool {
        let present = self.contains(mark);
        self.0 |= mark.bit();
        !present
    }

    /// Returns false if the mark was not present.
    pub fn remove(&mut self, mark: StyleMark) -> bool {
        let present = self.contains(mark);
        self.0 &= !mark.bit();
        present
    }

    pub fn contains(self, mark: StyleMark) -> bool {
        self.0 & mark.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn union(self, other: StyleSet) -> StyleSet {
        StyleSet(self.0 | other.0)
    }

    /// Iterate in serialization order (strong, em, code).
    pub fn iter(self) -> impl Iterator<Item = StyleMark> {
        StyleMark::ALL.into_iter().filter(move |mark| self.contains(*mark))
    }
}

impl FromIterator<StyleMark> for StyleSet {
    fn from_iter<I: IntoIterator<Item = StyleMark>>(iter: I) -> Self {
        let mut set = StyleSet::EMPTY;
        for mark in iter {
            set.insert(mark);
        }
        set
    }
}

/// A contiguous span of text sharing the same annotations within a block.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub key: RunKey,
    /// Plain text; never contains markup.
    pub text: String,
    pub styles: StyleSet,
    /// Reference into the owning block's mark registry.
    pub link: Option<MarkKey>,
}

impl Run {
    pub fn new(key: RunKey, text: impl Into<String>) -> Self {
        Run {
            key,
            text: text.into(),
            styles: StyleSet::EMPTY,
            link: None,
        }
    }

    pub fn with_styles(mut self, styles: StyleSet) -> Self {
        self.styles = styles;
        self
    }

    pub fn with_link(mut self, link: MarkKey) -> Self {
        self.link = Some(link);
        self
    }

    pub fn is_linked(&self) -> bool {
        self.link.is_some()
    }

    /// Two runs are merge-equivalent when they carry the same styles and link.
    pub fn same_annotations(&self, other: &Run) -> bool {
        self.styles == other.styles && self.link == other.link
    }
}
