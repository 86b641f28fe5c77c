//! Tagged blocks, the atomic unit of stored text.
//!
//! A block's text is never edited in place. Edits cut blocks into fragments
//! and splice brand-new blocks between them; only the tag set is ever
//! rewritten on an existing block.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::{BlockId, TagId};

/// A dated, tagged run of text in the timeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedBlock {
    /// Edit-stable identity. Absent in legacy snapshots.
    #[serde(default, skip_serializing_if = "BlockId::is_unassigned")]
    pub id: BlockId,
    /// Calendar day the text belongs to.
    pub date: NaiveDate,
    /// UTF-8 payload.
    pub text: String,
    /// Tag ids attached to this block, without duplicates.
    #[serde(default)]
    pub tags: Vec<TagId>,
}

impl TaggedBlock {
    /// Create an untagged block.
    pub fn new(id: BlockId, date: NaiveDate, text: impl Into<String>) -> Self {
        Self {
            id,
            date,
            text: text.into(),
            tags: Vec::new(),
        }
    }

    /// Builder-style tag assignment.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = TagId>) -> Self {
        self.set_tags(tags);
        self
    }

    /// Replace the tag set, dropping duplicates while keeping first-seen order.
    pub fn set_tags(&mut self, tags: impl IntoIterator<Item = TagId>) {
        self.tags.clear();
        for tag in tags {
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
    }

    /// Length in Unicode code points, the unit edit offsets are counted in.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Length in UTF-8 bytes.
    pub fn byte_count(&self) -> usize {
        self.text.len()
    }

    /// Check if the block carries any of the given tags.
    pub fn has_any_tag(&self, tags: &[TagId]) -> bool {
        self.tags.iter().any(|tag| tags.contains(tag))
    }

    /// Same tag set, ignoring order.
    pub fn same_tags(&self, other: &TaggedBlock) -> bool {
        self.tags.len() == other.tags.len() && self.tags.iter().all(|tag| other.tags.contains(tag))
    }

    /// A new block carrying this block's date and tags but different text.
    ///
    /// Used when a splice cuts this block into pieces.
    pub fn fragment(&self, id: BlockId, text: impl Into<String>) -> Self {
        Self {
            id,
            date: self.date,
            text: text.into(),
            tags: self.tags.clone(),
        }
    }
}

/// Split `text` after `char_index` code points.
///
/// Returns `None` when the string is shorter than `char_index`.
pub fn split_at_char(text: &str, char_index: usize) -> Option<(&str, &str)> {
    if char_index == 0 {
        return Some(("", text));
    }

    match text.char_indices().nth(char_index) {
        Some((byte, _)) => Some(text.split_at(byte)),
        None if text.chars().count() == char_index => Some((text, "")),
        None => None,
    }
}

/// Read-model row describing one block's place in the document.
///
/// Offsets are code-point positions in the full document, `end_offset`
/// exclusive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMetadata {
    /// Current position in document order. Shifts under edits.
    pub index: usize,
    /// Stable handle for the same block.
    pub id: BlockId,
    pub start_offset: usize,
    pub end_offset: usize,
    pub date: NaiveDate,
    #[serde(default)]
    pub tags: Vec<TagId>,
}
