//! Second pass over converted documents: bare URLs in plain text become
//! link-annotated runs backed by block-scoped mark definitions.

pub mod detect;
pub mod normalize;
pub mod rewrite;

use std::fmt;

use blocks::Document;
use tracing::debug;

pub use detect::{find_links, is_valid_url, trim_candidate};
pub use normalize::normalize_url;
pub use rewrite::{BlockReport, linkify_block};

/// Totals over one linkify pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkifyReport {
    pub blocks_scanned: usize,
    pub blocks_modified: usize,
    /// URL runs created. Several may share one definition.
    pub links_created: usize,
    pub definitions_added: usize,
}

impl LinkifyReport {
    fn record(&mut self, block: &BlockReport) {
        self.blocks_scanned += 1;
        if block.is_modified() {
            self.blocks_modified += 1;
        }
        self.links_created += block.links_created;
        self.definitions_added += block.definitions_added;
    }
}

impl fmt::Display for LinkifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} blocks modified, {} links created, {} definitions added",
            self.blocks_modified, self.blocks_scanned, self.links_created, self.definitions_added
        )
    }
}

/// Link every bare URL in the document's unlinked runs.
///
/// Running the pass on its own output changes nothing.
pub fn linkify(document: Document) -> Document {
    linkify_with_report(document).0
}

pub fn linkify_with_report(mut document: Document) -> (Document, LinkifyReport) {
    let mut report = LinkifyReport::default();
    for block in document.blocks_mut() {
        let block_report = linkify_block(block);
        if block_report.is_modified() {
            debug!(
                block = %block.key,
                links = block_report.links_created,
                "linkified block"
            );
        }
        report.record(&block_report);
    }
    (document, report)
}
