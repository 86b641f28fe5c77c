//! The timeline: one summary tree of blocks, one tag registry, one version.
//!
//! # Edit protocol
//!
//! ```text
//! apply_ops(base_version, ops)
//!     base_version != version ──▶ Err(VersionConflict { current_version })
//!     for op in ops (each sees the result of the previous one):
//!         Insert { position, text }   slice prefix ─ [head] ─ new block ─ [tail] ─ suffix
//!         Delete { start, end }       slice prefix ─ [head]  ···skip···  [tail] ─ suffix
//!     any op invalid ──▶ Err(..), timeline untouched
//!     all ok ──▶ commit tree, version += 1
//! ```
//!
//! The batch runs against a clone of the tree (an `Arc` bump) and is only
//! committed once every operation succeeded.

use std::collections::HashSet;

use chrono::NaiveDate;
use sightline_types::block::split_at_char;
use sightline_types::{
    BlockId, BlockMetadata, DocumentSnapshot, TagDescriptor, TagId, TaggedBlock, TextOperation,
};
use tracing::{debug, warn};

use crate::error::{ApplyOpsError, AssignBlockTagsError, InternTagError};
use crate::sum_tree::{Bias, SumTree};
use crate::summary::{BlockCount, BlockSummary, Chars};
use crate::tag_registry::TagRegistry;

#[derive(Clone, Debug)]
pub struct Timeline {
    pub(crate) tree: SumTree<TaggedBlock>,
    pub(crate) registry: TagRegistry,
    pub(crate) version: u64,
    pub(crate) next_block_id: BlockId,
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            tree: SumTree::new(),
            registry: TagRegistry::new(),
            version: 0,
            next_block_id: BlockId::FIRST,
        }
    }
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a version-0 timeline from blocks in document order.
    ///
    /// Blocks without an id are given one.
    pub fn from_blocks(blocks: impl IntoIterator<Item = TaggedBlock>, registry: TagRegistry) -> Self {
        Self::restore(blocks.into_iter().collect(), registry, 0, None)
    }

    /// Reassemble a timeline from persisted parts, repairing block ids that
    /// are missing or duplicated.
    pub(crate) fn restore(
        mut blocks: Vec<TaggedBlock>,
        registry: TagRegistry,
        version: u64,
        stored_next_id: Option<BlockId>,
    ) -> Self {
        let max_id = blocks.iter().map(|block| block.id).max().unwrap_or_default();
        let mut next_block_id = max_id
            .successor()
            .max(stored_next_id.unwrap_or_default())
            .max(BlockId::FIRST);

        let mut seen = HashSet::with_capacity(blocks.len());
        let mut assigned = 0usize;
        for block in &mut blocks {
            if block.id.is_unassigned() {
                block.id = allocate(&mut next_block_id);
                assigned += 1;
            } else if seen.contains(&block.id) {
                warn!(id = %block.id, "duplicate block id in snapshot, reassigning");
                block.id = allocate(&mut next_block_id);
            }
            seen.insert(block.id);
        }
        if assigned > 0 {
            debug!(assigned, "assigned ids to blocks without one");
        }

        Self {
            tree: SumTree::from_items(blocks),
            registry,
            version,
            next_block_id,
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn summary(&self) -> &BlockSummary {
        self.tree.summary()
    }

    pub fn block_count(&self) -> usize {
        self.summary().block_count as usize
    }

    /// Document length in code points.
    pub fn len_chars(&self) -> usize {
        self.summary().total_chars as usize
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn tag_registry(&self) -> &TagRegistry {
        &self.registry
    }

    /// Id the next created block will get.
    pub fn next_block_id(&self) -> BlockId {
        self.next_block_id
    }

    pub fn blocks(&self) -> impl Iterator<Item = &TaggedBlock> + '_ {
        self.tree.iter()
    }

    pub fn block(&self, index: usize) -> Option<&TaggedBlock> {
        self.tree
            .item_at(&BlockCount::from(index), Bias::Left)
            .map(|(_, block)| block)
    }

    /// Full document text.
    pub fn content(&self) -> String {
        self.tree.iter().map(|block| block.text.as_str()).collect()
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            content: self.content(),
            version: self.version,
        }
    }

    /// Text of every block dated `date`, in document order.
    pub fn log_for_date(&self, date: NaiveDate) -> String {
        self.log_for_range(date, date)
    }

    /// Text of every block dated within `from..=to`, in document order.
    pub fn log_for_range(&self, from: NaiveDate, to: NaiveDate) -> String {
        if from > to {
            return String::new();
        }
        self.tree
            .filter::<(), _>(|summary| summary.may_overlap_dates(from, to))
            .filter(|(_, block)| from <= block.date && block.date <= to)
            .map(|(_, block)| block.text.as_str())
            .collect()
    }

    /// Per-block offsets for aligning a view with the document.
    pub fn list_blocks(&self) -> Vec<BlockMetadata> {
        self.tree
            .filter::<Chars, _>(|_| true)
            .enumerate()
            .map(|(index, (start, block))| {
                let start_offset = start.0 as usize;
                BlockMetadata {
                    index,
                    id: block.id,
                    start_offset,
                    end_offset: start_offset + block.char_count(),
                    date: block.date,
                    tags: block.tags.clone(),
                }
            })
            .collect()
    }

    /// Current index of the block with `id`. Linear in the block count.
    pub fn block_index(&self, id: BlockId) -> Option<usize> {
        self.tree.iter().position(|block| block.id == id)
    }

    // ========================================================================
    // Edits
    // ========================================================================

    /// Apply a batch, stamping inserted blocks with today's local date.
    pub fn apply_ops(&mut self, base_version: u64, ops: &[TextOperation]) -> Result<u64, ApplyOpsError> {
        let today = chrono::Local::now().date_naive();
        self.apply_ops_on(base_version, ops, today)
    }

    /// Apply a batch against `base_version`.
    ///
    /// Operations run in order, each against the document left by the one
    /// before. Either every operation applies and the version advances by
    /// exactly one, or nothing changes.
    pub fn apply_ops_on(
        &mut self,
        base_version: u64,
        ops: &[TextOperation],
        date_for_inserts: NaiveDate,
    ) -> Result<u64, ApplyOpsError> {
        if base_version != self.version {
            warn!(
                base_version,
                current_version = self.version,
                "rejecting edit batch against stale version"
            );
            return Err(ApplyOpsError::VersionConflict {
                current_version: self.version,
                base_version,
            });
        }

        let mut tree = self.tree.clone();
        let mut next_block_id = self.next_block_id;
        for (index, op) in ops.iter().enumerate() {
            let applied = match op {
                TextOperation::Insert { position, text } => {
                    apply_insert(&tree, *position, text, date_for_inserts, &mut next_block_id)
                }
                TextOperation::Delete {
                    start_position,
                    end_position,
                } => apply_delete(&tree, *start_position, *end_position, &mut next_block_id),
            };
            match applied {
                Ok(next) => tree = next,
                Err(err) => {
                    warn!(op_index = index, error = %err, "rejecting invalid edit batch");
                    return Err(err);
                }
            }
        }

        self.tree = tree;
        self.next_block_id = next_block_id;
        self.version += 1;
        debug!(
            version = self.version,
            ops = ops.len(),
            blocks = self.block_count(),
            "applied edit batch"
        );
        Ok(self.version)
    }

    // ========================================================================
    // Tags
    // ========================================================================

    /// Intern a tag typed by a user (`#project:home`, ` work `, ...).
    pub fn intern_tag(&mut self, raw: &str) -> Result<TagDescriptor, InternTagError> {
        let path = tag_path(raw)?;
        let id = self
            .registry
            .intern_colon_path(path)
            .ok_or(InternTagError::Invalid)?;
        self.describe_tag(id)
    }

    pub fn describe_tag(&self, id: TagId) -> Result<TagDescriptor, InternTagError> {
        let name = self
            .registry
            .full_name(id)
            .ok_or(InternTagError::MissingName(id))?;
        Ok(TagDescriptor {
            id,
            name: format!("#{name}"),
            color: self.registry.color(id),
        })
    }

    /// Every tag, sorted by full name.
    pub fn list_tags(&self) -> Vec<TagDescriptor> {
        let mut descriptors: Vec<TagDescriptor> = self
            .registry
            .tag_names()
            .into_iter()
            .map(|(id, name)| TagDescriptor {
                id,
                name: format!("#{name}"),
                color: self.registry.color(id),
            })
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Replace the tag set of the block at `block_index`.
    ///
    /// Every name is validated before any is interned, so a bad name leaves
    /// both the registry and the block untouched.
    pub fn assign_block_tags<S: AsRef<str>>(
        &mut self,
        block_index: usize,
        tag_names: &[S],
    ) -> Result<Vec<TagDescriptor>, AssignBlockTagsError> {
        let block_count = self.block_count();
        if block_index >= block_count {
            return Err(AssignBlockTagsError::UnknownBlock {
                index: block_index,
                block_count,
            });
        }
        for name in tag_names {
            tag_path(name.as_ref())?;
        }

        let mut descriptors: Vec<TagDescriptor> = Vec::with_capacity(tag_names.len());
        for name in tag_names {
            let descriptor = self.intern_tag(name.as_ref())?;
            if !descriptors.iter().any(|d| d.id == descriptor.id) {
                descriptors.push(descriptor);
            }
        }

        let mut cursor = self.tree.cursor::<BlockCount>();
        let mut tree = cursor.slice(&BlockCount::from(block_index), Bias::Left);
        let Some(mut block) = cursor.item().cloned() else {
            return Err(AssignBlockTagsError::UnknownBlock {
                index: block_index,
                block_count,
            });
        };
        cursor.next();
        block.set_tags(descriptors.iter().map(|d| d.id));
        debug!(id = %block.id, index = block_index, tags = block.tags.len(), "assigned block tags");
        tree.push(block);
        tree.append(cursor.suffix());
        self.tree = tree;

        Ok(descriptors)
    }

    /// [`Self::assign_block_tags`] addressed by block id instead of index.
    pub fn assign_tags_by_id<S: AsRef<str>>(
        &mut self,
        id: BlockId,
        tag_names: &[S],
    ) -> Result<Vec<TagDescriptor>, AssignBlockTagsError> {
        let index = self
            .block_index(id)
            .ok_or(AssignBlockTagsError::UnknownBlockId(id))?;
        self.assign_block_tags(index, tag_names)
    }
}

/// Validate raw tag input and return the colon path inside it.
fn tag_path(raw: &str) -> Result<&str, InternTagError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InternTagError::Empty);
    }
    let path = trimmed.trim_start_matches('#').trim();
    if path.split(':').all(|segment| segment.trim().is_empty()) {
        return Err(InternTagError::Invalid);
    }
    Ok(path)
}

fn allocate(next: &mut BlockId) -> BlockId {
    let id = *next;
    *next = next.successor();
    id
}

// ============================================================================
// Splices
// ============================================================================

/// Insert `text` as a new block at code-point `position`.
///
/// A block straddling `position` is cut in two: the head keeps its id, the
/// tail gets a fresh one, and both keep the original date and tags.
fn apply_insert(
    tree: &SumTree<TaggedBlock>,
    position: usize,
    text: &str,
    date: NaiveDate,
    next_block_id: &mut BlockId,
) -> Result<SumTree<TaggedBlock>, ApplyOpsError> {
    let len = tree.summary().total_chars as usize;
    let invalid = ApplyOpsError::InvalidPosition { position, len };
    if position > len {
        return Err(invalid);
    }
    if text.is_empty() {
        return Ok(tree.clone());
    }

    let mut cursor = tree.cursor::<Chars>();
    let mut result = cursor.slice(&Chars::from(position), Bias::Left);
    let block_start = cursor.start().0 as usize;
    let inserted = TaggedBlock::new(allocate(next_block_id), date, text);

    if block_start < position {
        let block = cursor.item().cloned().ok_or_else(|| invalid.clone())?;
        cursor.next();
        let (head, tail) =
            split_at_char(&block.text, position - block_start).ok_or_else(|| invalid.clone())?;
        let tail = block.fragment(allocate(next_block_id), tail);
        result.push(block.fragment(block.id, head));
        result.push(inserted);
        result.push(tail);
    } else {
        result.push(inserted);
    }

    result.append(cursor.suffix());
    Ok(result)
}

/// Remove code points `start..end`.
///
/// Partially covered blocks keep their surviving text. The piece holding a
/// block's original start keeps its id; when that start was deleted the
/// surviving tail inherits the id instead.
fn apply_delete(
    tree: &SumTree<TaggedBlock>,
    start: usize,
    end: usize,
    next_block_id: &mut BlockId,
) -> Result<SumTree<TaggedBlock>, ApplyOpsError> {
    let len = tree.summary().total_chars as usize;
    let invalid = ApplyOpsError::InvalidRange { start, end, len };
    if start > end || end > len {
        return Err(invalid);
    }
    if start == end {
        return Ok(tree.clone());
    }

    let mut cursor = tree.cursor::<Chars>();
    let mut result = cursor.slice(&Chars::from(start), Bias::Left);

    let head_start = cursor.start().0 as usize;
    if head_start < start {
        let block = cursor.item().ok_or_else(|| invalid.clone())?;
        let (head, _) =
            split_at_char(&block.text, start - head_start).ok_or_else(|| invalid.clone())?;
        result.push(block.fragment(block.id, head));
    }

    if !cursor.seek(&Chars::from(end), Bias::Left) {
        return Err(invalid);
    }

    let tail_start = cursor.start().0 as usize;
    if tail_start < end {
        let block = cursor.item().cloned().ok_or_else(|| invalid.clone())?;
        cursor.next();
        let (_, tail) =
            split_at_char(&block.text, end - tail_start).ok_or_else(|| invalid.clone())?;
        let id = if tail_start < start {
            allocate(next_block_id)
        } else {
            block.id
        };
        result.push(block.fragment(id, tail));
    }

    result.append(cursor.suffix());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn block(text: &str, d: u32) -> TaggedBlock {
        TaggedBlock::new(BlockId::UNASSIGNED, day(d), text)
    }

    fn timeline(texts: &[&str]) -> Timeline {
        Timeline::from_blocks(
            texts.iter().enumerate().map(|(i, t)| block(t, i as u32 + 1)),
            TagRegistry::new(),
        )
    }

    fn texts(timeline: &Timeline) -> Vec<String> {
        timeline.blocks().map(|b| b.text.clone()).collect()
    }

    #[test]
    fn test_hello_world_scenario() {
        let mut tl = timeline(&["Hello world"]);
        let ops = [TextOperation::delete(6, 11), TextOperation::insert(6, "there")];

        assert_eq!(tl.apply_ops_on(0, &ops, day(9)), Ok(1));
        assert_eq!(tl.content(), "Hello there");

        let err = tl.apply_ops_on(0, &ops, day(9)).unwrap_err();
        assert_eq!(
            err,
            ApplyOpsError::VersionConflict {
                current_version: 1,
                base_version: 0
            }
        );
        assert_eq!(tl.content(), "Hello there");
        assert_eq!(tl.version(), 1);
    }

    #[test]
    fn test_insert_at_boundary_creates_block() {
        let mut tl = timeline(&["abc", "def"]);
        tl.apply_ops_on(0, &[TextOperation::insert(3, "XY")], day(20)).unwrap();
        assert_eq!(texts(&tl), vec!["abc", "XY", "def"]);
        assert_eq!(tl.block(1).unwrap().date, day(20));
        assert!(tl.block(1).unwrap().tags.is_empty());
    }

    #[test]
    fn test_insert_at_document_edges() {
        let mut tl = timeline(&["mid"]);
        tl.apply_ops_on(0, &[TextOperation::insert(0, "<"), TextOperation::insert(4, ">")], day(5))
            .unwrap();
        assert_eq!(tl.content(), "<mid>");
        assert_eq!(texts(&tl), vec!["<", "mid", ">"]);
    }

    #[test]
    fn test_insert_inside_block_splits_it() {
        let mut tl = timeline(&["héllo"]);
        let original_id = tl.block(0).unwrap().id;
        tl.assign_block_tags(0, &["mood"]).unwrap();

        tl.apply_ops_on(0, &[TextOperation::insert(2, "—")], day(28)).unwrap();
        assert_eq!(texts(&tl), vec!["hé", "—", "llo"]);

        let blocks: Vec<&TaggedBlock> = tl.blocks().collect();
        assert_eq!(blocks[0].id, original_id);
        assert_ne!(blocks[2].id, original_id);
        assert_eq!(blocks[0].date, day(1));
        assert_eq!(blocks[2].date, day(1));
        assert_eq!(blocks[0].tags, blocks[2].tags);
        assert!(blocks[1].tags.is_empty());
    }

    #[test]
    fn test_delete_within_block() {
        let mut tl = timeline(&["abcdef"]);
        let id = tl.block(0).unwrap().id;
        tl.apply_ops_on(0, &[TextOperation::delete(2, 4)], day(1)).unwrap();
        assert_eq!(texts(&tl), vec!["ab", "ef"]);
        assert_eq!(tl.block(0).unwrap().id, id);
        assert_ne!(tl.block(1).unwrap().id, id);
    }

    #[test]
    fn test_delete_spanning_blocks_keeps_fragments() {
        let mut tl = timeline(&["one ", "two ", "three"]);
        let ids: Vec<BlockId> = tl.blocks().map(|b| b.id).collect();

        tl.apply_ops_on(0, &[TextOperation::delete(2, 10)], day(1)).unwrap();
        assert_eq!(tl.content(), "onree");
        assert_eq!(texts(&tl), vec!["on", "ree"]);
        // Head keeps its id; the tail's start was deleted, so it keeps its own.
        assert_eq!(tl.block(0).unwrap().id, ids[0]);
        assert_eq!(tl.block(1).unwrap().id, ids[2]);
    }

    #[test]
    fn test_delete_whole_blocks_at_boundaries() {
        let mut tl = timeline(&["aa", "bb", "cc"]);
        tl.apply_ops_on(0, &[TextOperation::delete(2, 4)], day(1)).unwrap();
        assert_eq!(texts(&tl), vec!["aa", "cc"]);
    }

    #[test]
    fn test_delete_everything() {
        let mut tl = timeline(&["aa", "bb"]);
        tl.apply_ops_on(0, &[TextOperation::delete(0, 4)], day(1)).unwrap();
        assert!(tl.is_empty());
        assert_eq!(tl.content(), "");
        assert_eq!(tl.block_count(), 0);
    }

    #[test]
    fn test_invalid_ops_leave_timeline_untouched() {
        let mut tl = timeline(&["hello"]);
        let before = tl.list_blocks();

        let err = tl
            .apply_ops_on(0, &[TextOperation::insert(0, "ok "), TextOperation::insert(99, "x")], day(1))
            .unwrap_err();
        assert_eq!(err, ApplyOpsError::InvalidPosition { position: 99, len: 8 });

        let err = tl.apply_ops_on(0, &[TextOperation::delete(4, 2)], day(1)).unwrap_err();
        assert!(matches!(err, ApplyOpsError::InvalidRange { start: 4, end: 2, .. }));

        let err = tl.apply_ops_on(0, &[TextOperation::delete(0, 6)], day(1)).unwrap_err();
        assert!(matches!(err, ApplyOpsError::InvalidRange { .. }));

        assert_eq!(tl.content(), "hello");
        assert_eq!(tl.version(), 0);
        assert_eq!(tl.list_blocks(), before);
    }

    #[test]
    fn test_version_bumps_once_per_batch() {
        let mut tl = timeline(&[]);
        let ops: Vec<TextOperation> = (0..5).map(|i| TextOperation::insert(i, "x")).collect();
        assert_eq!(tl.apply_ops_on(0, &ops, day(1)), Ok(1));
        assert_eq!(tl.apply_ops_on(1, &[], day(1)), Ok(2));
        assert_eq!(tl.apply_ops_on(2, &[TextOperation::insert(0, "")], day(1)), Ok(3));
        assert_eq!(tl.content(), "xxxxx");
    }

    #[test]
    fn test_list_blocks_offsets_and_ids() {
        let mut tl = timeline(&["ab", "日本語", "c"]);
        tl.assign_block_tags(1, &["lang:ja"]).unwrap();
        let blocks = tl.list_blocks();

        let ranges: Vec<(usize, usize)> =
            blocks.iter().map(|b| (b.start_offset, b.end_offset)).collect();
        assert_eq!(ranges, vec![(0, 2), (2, 5), (5, 6)]);
        assert_eq!(blocks[1].index, 1);
        assert_eq!(blocks[1].tags.len(), 1);
        assert_eq!(blocks[1].date, day(2));
        let ids: Vec<u64> = blocks.iter().map(|b| b.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_block_lookup_by_index() {
        let names: Vec<String> = (0..25).map(|i| format!("b{i} ")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let tl = timeline(&refs);

        for (i, expected) in tl.blocks().enumerate() {
            assert_eq!(tl.block(i), Some(expected));
        }
        assert_eq!(tl.block(25), None);
        assert_eq!(Timeline::new().block(0), None);
    }

    #[test]
    fn test_block_index_follows_shifts() {
        let mut tl = timeline(&["first", "second"]);
        let second = tl.block(1).unwrap().id;
        tl.apply_ops_on(0, &[TextOperation::insert(0, "zero ")], day(1)).unwrap();
        assert_eq!(tl.block_index(second), Some(2));

        tl.assign_tags_by_id(second, &["moved"]).unwrap();
        assert_eq!(tl.block(2).unwrap().tags.len(), 1);
        assert_eq!(
            tl.assign_tags_by_id(BlockId::new(999), &["x"]),
            Err(AssignBlockTagsError::UnknownBlockId(BlockId::new(999)))
        );
    }

    #[test]
    fn test_log_for_date_and_range() {
        let mut tl = timeline(&["a1 ", "b2 ", "c3 "]);
        tl.apply_ops_on(0, &[TextOperation::insert(9, "d1")], day(1)).unwrap();

        assert_eq!(tl.log_for_date(day(1)), "a1 d1");
        assert_eq!(tl.log_for_date(day(2)), "b2 ");
        assert_eq!(tl.log_for_date(day(30)), "");
        assert_eq!(tl.log_for_range(day(2), day(3)), "b2 c3 ");
        assert_eq!(tl.log_for_range(day(3), day(2)), "");
    }

    #[test]
    fn test_intern_tag_normalizes_input() {
        let mut tl = Timeline::new();
        let descriptor = tl.intern_tag("  #project:sightline ").unwrap();
        assert_eq!(descriptor.name, "#project:sightline");
        assert_eq!(descriptor.color, sightline_types::color_for(descriptor.id));
        assert_eq!(tl.intern_tag("project:sightline").unwrap().id, descriptor.id);

        assert_eq!(tl.intern_tag("   "), Err(InternTagError::Empty));
        assert_eq!(tl.intern_tag("#"), Err(InternTagError::Invalid));
        assert_eq!(tl.intern_tag("#: :"), Err(InternTagError::Invalid));
    }

    #[test]
    fn test_list_tags_sorted_by_name() {
        let mut tl = Timeline::new();
        tl.intern_tag("zeta").unwrap();
        tl.intern_tag("alpha:beta").unwrap();
        let names: Vec<String> = tl.list_tags().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["#alpha", "#alpha:beta", "#zeta"]);
    }

    #[test]
    fn test_assign_block_tags_replaces_set() {
        let mut tl = timeline(&["a", "b", "c"]);
        let descriptors = tl.assign_block_tags(1, &["#work", "work", "home"]).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(tl.block(1).unwrap().tags.len(), 2);

        tl.assign_block_tags(1, &["solo"]).unwrap();
        let solo = tl.tag_registry().lookup_colon_path("solo").unwrap();
        assert_eq!(tl.block(1).unwrap().tags, vec![solo]);
        assert_eq!(texts(&tl), vec!["a", "b", "c"]);
        assert!(tl.summary().tags_filter.might_contain(solo));
    }

    #[test]
    fn test_assign_block_tags_rejects_bad_input() {
        let mut tl = timeline(&["a"]);
        assert_eq!(
            tl.assign_block_tags(3, &["x"]),
            Err(AssignBlockTagsError::UnknownBlock { index: 3, block_count: 1 })
        );
        assert_eq!(
            tl.assign_block_tags(0, &["fine", " "]),
            Err(AssignBlockTagsError::Intern(InternTagError::Empty))
        );
        // Validation happens before interning.
        assert!(tl.tag_registry().is_empty());
    }

    #[test]
    fn test_restore_repairs_ids() {
        let mut blocks = vec![block("a", 1), block("b", 1), block("c", 1)];
        blocks[0].id = BlockId::new(4);
        blocks[1].id = BlockId::new(4);
        let tl = Timeline::restore(blocks, TagRegistry::new(), 7, Some(BlockId::new(2)));

        let ids: Vec<BlockId> = tl.blocks().map(|b| b.id).collect();
        assert_eq!(ids[0], BlockId::new(4));
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 3);
        assert!(ids.iter().all(|id| !id.is_unassigned()));
        assert_eq!(tl.version(), 7);
        assert_eq!(tl.next_block_id(), BlockId::new(7));
    }

    #[test]
    fn test_clone_is_isolated_from_edits() {
        let original = timeline(&["stable"]);
        let mut copy = original.clone();
        copy.apply_ops_on(0, &[TextOperation::delete(0, 3)], day(1)).unwrap();
        assert_eq!(original.content(), "stable");
        assert_eq!(original.version(), 0);
        assert_eq!(copy.content(), "ble");
    }

    #[test]
    fn test_snapshot_pairs_content_with_version() {
        let mut tl = timeline(&["x"]);
        tl.apply_ops_on(0, &[TextOperation::insert(1, "y")], day(1)).unwrap();
        assert_eq!(
            tl.snapshot(),
            DocumentSnapshot {
                content: "xy".into(),
                version: 1
            }
        );
    }
}
