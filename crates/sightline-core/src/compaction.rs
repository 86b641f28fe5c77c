//! Block compaction.
//!
//! Edits never merge blocks: every insert is its own block and every cut
//! leaves fragments behind. Compaction is the separate pass that folds runs
//! of adjacent blocks sharing a date and tag set back together, bounded by a
//! per-block size limit. It never changes the document text or version.

use serde::{Deserialize, Serialize};
use sightline_types::TaggedBlock;
use tracing::debug;

use crate::sum_tree::SumTree;
use crate::timeline::Timeline;

/// Default upper bound on a merged block, in code points.
pub const DEFAULT_MAX_BLOCK_CHARS: usize = 4096;

/// What a compaction pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactionReport {
    pub blocks_before: usize,
    pub blocks_after: usize,
}

impl CompactionReport {
    pub fn merged(&self) -> usize {
        self.blocks_before - self.blocks_after
    }
}

impl Timeline {
    /// Merge adjacent same-date, same-tag blocks while the merged text stays
    /// within `max_block_chars` code points.
    ///
    /// A merged block keeps the id of the first block in its run.
    pub fn compact(&mut self, max_block_chars: usize) -> CompactionReport {
        let blocks_before = self.block_count();
        let mut merged: Vec<TaggedBlock> = Vec::with_capacity(blocks_before);
        let mut run_chars = 0usize;

        for block in self.tree.iter() {
            let chars = block.char_count();
            match merged.last_mut() {
                Some(last) if mergeable(last, block) && run_chars + chars <= max_block_chars => {
                    last.text.push_str(&block.text);
                    run_chars += chars;
                }
                _ => {
                    merged.push(block.clone());
                    run_chars = chars;
                }
            }
        }

        let report = CompactionReport {
            blocks_before,
            blocks_after: merged.len(),
        };
        if report.merged() > 0 {
            self.tree = SumTree::from_items(merged);
            debug!(
                before = report.blocks_before,
                after = report.blocks_after,
                "compacted timeline"
            );
        }
        report
    }
}

fn mergeable(left: &TaggedBlock, right: &TaggedBlock) -> bool {
    left.date == right.date && left.same_tags(right)
}
