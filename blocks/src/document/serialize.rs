//! Serde mapping between the typed model and the portable-blocks record format.
//!
//! A document serializes as an array of block records:
//!
//! ```json
//! [{
//!   "id": "block-0",
//!   "style": "normal",
//!   "listItem": "bullet",
//!   "level": 1,
//!   "markDefs": [{ "key": "link-0", "type": "link", "href": "https://example.com" }],
//!   "children": [{ "key": "span-0-0", "text": "example.com", "marks": ["strong", "link-0"] }]
//! }]
//! ```
//!
//! Content-store spellings (`_key`, `_type`) are accepted on input.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::block::marks::{MarkDefinition, MarkKey, MarkKind, MarkRegistry};
use crate::block::run::{Run, RunKey, StyleMark, StyleSet};
use crate::block::{Block, BlockKey, BlockStyle, ListInfo, ListKind};
use crate::document::Document;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    #[serde(alias = "_key")]
    pub id: String,
    #[serde(default = "normal_style")]
    pub style: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_item: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(default)]
    pub mark_defs: Vec<MarkDefRecord>,
    #[serde(default)]
    pub children: Vec<SpanRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkDefRecord {
    #[serde(alias = "_key")]
    pub key: String,
    #[serde(rename = "type", alias = "_type")]
    pub kind: String,
    pub href: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanRecord {
    #[serde(alias = "_key")]
    pub key: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub marks: Vec<String>,
}

fn normal_style() -> String {
    "normal".to_string()
}

/// A record that does not describe a valid block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordError {
    pub block: String,
    pub message: String,
}

impl RecordError {
    fn new(block: &str, message: impl Into<String>) -> Self {
        RecordError {
            block: block.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block `{}`: {}", self.block, self.message)
    }
}

impl std::error::Error for RecordError {}

impl From<&Block> for BlockRecord {
    fn from(block: &Block) -> Self {
        BlockRecord {
            id: block.key.to_string(),
            style: block.style.name(),
            list_item: block.list.map(|list| list.kind.name().to_string()),
            level: block.list.map(|list| list.level),
            mark_defs: block
                .marks
                .iter()
                .map(|def| MarkDefRecord {
                    key: def.key.to_string(),
                    kind: def.kind.name().to_string(),
                    href: def.href.clone(),
                })
                .collect(),
            children: block
                .runs
                .iter()
                .map(|run| SpanRecord {
                    key: run.key.to_string(),
                    text: run.text.clone(),
                    marks: run
                        .styles
                        .iter()
                        .map(|mark| mark.name().to_string())
                        .chain(run.link.iter().map(|key| key.to_string()))
                        .collect(),
                })
                .collect(),
        }
    }
}

impl TryFrom<BlockRecord> for Block {
    type Error = RecordError;

    fn try_from(record: BlockRecord) -> Result<Self, Self::Error> {
        let id = record.id;

        let style = BlockStyle::from_name(&record.style)
            .ok_or_else(|| RecordError::new(&id, format!("unsupported style `{}`", record.style)))?;

        let list = match record.list_item {
            Some(name) => {
                let kind = ListKind::from_name(&name)
                    .ok_or_else(|| RecordError::new(&id, format!("unsupported list item `{}`", name)))?;
                Some(ListInfo {
                    kind,
                    level: record.level.unwrap_or(1).max(1),
                })
            }
            None => None,
        };

        let mut marks = MarkRegistry::new();
        for def in record.mark_defs {
            if def.kind != MarkKind::Link.name() {
                return Err(RecordError::new(
                    &id,
                    format!("unsupported mark definition type `{}`", def.kind),
                ));
            }
            let definition = MarkDefinition {
                key: MarkKey::new(def.key),
                kind: MarkKind::Link,
                href: def.href,
            };
            marks.insert(definition).map_err(|dup| {
                let message = if marks.contains_key(&dup.key) {
                    format!("duplicate mark definition key `{}`", dup.key)
                } else {
                    format!("mark definition `{}` repeats link target `{}`", dup.key, dup.href)
                };
                RecordError::new(&id, message)
            })?;
        }

        let mut runs = Vec::with_capacity(record.children.len());
        for child in record.children {
            let mut styles = StyleSet::EMPTY;
            let mut link = None;
            for mark in &child.marks {
                if let Some(style) = StyleMark::from_name(mark) {
                    styles.insert(style);
                    continue;
                }
                let key = MarkKey::new(mark.as_str());
                if !marks.contains_key(&key) {
                    return Err(RecordError::new(
                        &id,
                        format!(
                            "mark `{}` on span `{}` is neither a style nor a markDefs key",
                            mark, child.key
                        ),
                    ));
                }
                if link.is_some() {
                    return Err(RecordError::new(
                        &id,
                        format!("span `{}` references more than one link", child.key),
                    ));
                }
                link = Some(key);
            }
            runs.push(Run {
                key: RunKey::new(child.key),
                text: child.text,
                styles,
                link,
            });
        }

        Ok(Block {
            key: BlockKey::new(id),
            style,
            list,
            marks,
            runs,
        })
    }
}

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        BlockRecord::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = BlockRecord::deserialize(deserializer)?;
        Block::try_from(record).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.blocks())
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<Block>::deserialize(deserializer).map(Document::new)
    }
}
