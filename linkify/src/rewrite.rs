use std::collections::HashSet;
use std::mem;
use std::ops::Range;

use blocks::{Block, Run, RunKey};

use crate::detect::find_links;
use crate::normalize::normalize_url;

/// What linkifying one block changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockReport {
    pub runs_split: usize,
    pub links_created: usize,
    pub definitions_added: usize,
}

impl BlockReport {
    pub fn is_modified(&self) -> bool {
        self.runs_split > 0
    }
}

/// Split every unlinked run of `block` around the URLs it contains.
///
/// Sub-runs keep the original styles and together spell the original text.
/// URL sub-runs reference a link definition in the block's registry, shared
/// with any existing definition for the same target.
pub fn linkify_block(block: &mut Block) -> BlockReport {
    let mut report = BlockReport::default();
    let mut taken: HashSet<RunKey> = block.runs.iter().map(|run| run.key.clone()).collect();
    let mut runs = Vec::with_capacity(block.runs.len());

    for run in mem::take(&mut block.runs) {
        if run.is_linked() {
            runs.push(run);
            continue;
        }
        let links = find_links(&run.text);
        if links.is_empty() {
            runs.push(run);
            continue;
        }

        report.runs_split += 1;
        for (i, piece) in pieces(run.text.len(), &links).into_iter().enumerate() {
            let text = run.text[piece.range].to_string();
            let link = if piece.is_link {
                let (key, added) = block.marks.intern_link(&normalize_url(&text));
                report.links_created += 1;
                if added {
                    report.definitions_added += 1;
                }
                Some(key)
            } else {
                None
            };

            runs.push(Run {
                key: sub_key(&run.key, i, &mut taken),
                text,
                styles: run.styles,
                link,
            });
        }
    }

    block.runs = runs;
    report
}

struct Piece {
    range: Range<usize>,
    is_link: bool,
}

/// Plain and URL pieces covering `0..len`, in order. Empty gaps are skipped.
fn pieces(len: usize, links: &[Range<usize>]) -> Vec<Piece> {
    let mut pieces = Vec::with_capacity(links.len() * 2 + 1);
    let mut cursor = 0;
    for link in links {
        if link.start > cursor {
            pieces.push(Piece {
                range: cursor..link.start,
                is_link: false,
            });
        }
        pieces.push(Piece {
            range: link.clone(),
            is_link: true,
        });
        cursor = link.end;
    }
    if cursor < len {
        pieces.push(Piece {
            range: cursor..len,
            is_link: false,
        });
    }
    pieces
}

/// `{original}-{i}`, with the suffix bumped past keys already in the block.
fn sub_key(original: &RunKey, index: usize, taken: &mut HashSet<RunKey>) -> RunKey {
    let mut suffix = index;
    loop {
        let key = RunKey::new(format!("{}-{}", original, suffix));
        if taken.insert(key.clone()) {
            return key;
        }
        suffix += 1;
    }
}
