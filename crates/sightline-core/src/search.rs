//! Tag search over the timeline.
//!
//! Queries are matched against full tag names in the registry (lowercased,
//! leading `#` stripped), then the tree is walked with the summary Bloom
//! filters pruning every subtree that cannot hold a matching tag. Filter hits
//! are confirmed against each block's tag list before being reported.

use sightline_types::{TagId, TagSuggestion};

use crate::summary::BlockCount;
use crate::timeline::Timeline;

impl Timeline {
    /// Indices of blocks carrying a tag whose name starts with `query`.
    pub fn search_prefix(&self, query: &str) -> Vec<usize> {
        let tag_ids = self.registry.tag_ids_with_prefix(query);
        self.blocks_with_any_tag(&tag_ids)
    }

    /// Indices of blocks carrying a tag whose name contains `query`.
    pub fn search_infix(&self, query: &str) -> Vec<usize> {
        let tag_ids = self.registry.tag_ids_with_infix(query);
        self.blocks_with_any_tag(&tag_ids)
    }

    pub fn autocomplete_tags(&self, partial: &str) -> Vec<TagSuggestion> {
        self.registry.autocomplete(partial)
    }

    /// Indices, ascending, of blocks tagged with any of `tag_ids`.
    pub fn blocks_with_any_tag(&self, tag_ids: &[TagId]) -> Vec<usize> {
        if tag_ids.is_empty() {
            return Vec::new();
        }

        self.tree
            .filter::<BlockCount, _>(|summary| summary.tags_filter.might_contain_any(tag_ids))
            .filter(|(_, block)| block.has_any_tag(tag_ids))
            .map(|(position, _)| position.0 as usize)
            .collect()
    }
}
