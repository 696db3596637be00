mod builder;
pub mod entity;
pub mod inline;
pub mod segment;
pub mod warning;

pub use entity::{decode_entities, normalize, strip_tags};
pub use inline::AnchorPolicy;
pub use warning::ConversionWarning;

use tracing::debug;

use crate::document::Document;
use crate::parser::builder::DocumentBuilder;

/// Conversion settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    pub anchors: AnchorPolicy,
}

/// Result of a conversion together with what was noticed along the way.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub document: Document,
    /// Malformed-markup reports. Never fatal.
    pub warnings: Vec<ConversionWarning>,
    /// The normalized HTML that warning spans point into.
    pub normalized: String,
}

/// HTML to portable-blocks converter entry point.
pub struct Converter {
    source: String,
    file_id: usize,
    options: ConvertOptions,
}

impl Converter {
    pub fn new(source: impl Into<String>, file_id: usize) -> Self {
        Converter {
            source: source.into(),
            file_id,
            options: ConvertOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    /// Convert the source HTML into a document.
    pub fn convert(&self) -> Document {
        self.convert_with_warnings().document
    }

    /// Convert the source HTML, keeping the warnings and the normalized text.
    pub fn convert_with_warnings(&self) -> Conversion {
        let normalized = entity::normalize(&self.source);
        let raw_blocks = segment::segment(&normalized);
        debug!(raw_blocks = raw_blocks.len(), "segmented html");

        let mut builder = DocumentBuilder::new(&normalized, self.file_id, self.options.anchors);
        for raw in &raw_blocks {
            builder.push(raw);
        }
        let (blocks, warnings) = builder.finish();
        debug!(
            blocks = blocks.len(),
            warnings = warnings.len(),
            "built document"
        );

        Conversion {
            document: Document::new(blocks),
            warnings,
            normalized,
        }
    }
}
