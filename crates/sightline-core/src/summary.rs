//! Block summaries: the monoid cached on every tree node.
//!
//! | Field         | Combine       |
//! |---------------|---------------|
//! | `total_chars` | sum           |
//! | `total_bytes` | sum           |
//! | `block_count` | sum           |
//! | `min_date`    | min           |
//! | `max_date`    | max           |
//! | `tags_filter` | bitwise OR    |

use std::fmt;

use bloomfilter::Bloom;
use chrono::NaiveDate;
use sightline_types::{TagId, TaggedBlock};
use tracing::warn;

use crate::sum_tree::{Dimension, Item, Summary};

const TAG_FILTER_CAPACITY: usize = 256;
const TAG_FILTER_FALSE_POSITIVE_RATE: f64 = 0.01;
const TAG_FILTER_SEED: [u8; 32] = [0; 32];

/// Bloom filter over tag ids.
///
/// Every filter is built with the same capacity, rate and seed, so two
/// filters share a bit layout and union is a byte-wise OR of their bitmaps.
/// A miss is definitive; a hit must be confirmed against the block's real
/// tag list.
#[derive(Clone, Default)]
pub struct TagFilter(Repr);

#[derive(Clone, Default)]
enum Repr {
    /// No tags inserted yet. Nothing is allocated.
    #[default]
    Empty,
    Bits(Bloom<TagId>),
    /// Could not build or merge a bitmap; every query answers "maybe".
    Saturated,
}

impl TagFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tags(tags: &[TagId]) -> Self {
        let mut filter = Self::new();
        for tag in tags {
            filter.insert(*tag);
        }
        filter
    }

    pub fn insert(&mut self, tag: TagId) {
        match &mut self.0 {
            Repr::Bits(bloom) => bloom.set(&tag),
            Repr::Saturated => {}
            Repr::Empty => {
                self.0 = match new_tag_bloom() {
                    Some(mut bloom) => {
                        bloom.set(&tag);
                        Repr::Bits(bloom)
                    }
                    None => Repr::Saturated,
                };
            }
        }
    }

    pub fn might_contain(&self, tag: TagId) -> bool {
        match &self.0 {
            Repr::Empty => false,
            Repr::Bits(bloom) => bloom.check(&tag),
            Repr::Saturated => true,
        }
    }

    /// Check if any of `tags` may be present.
    pub fn might_contain_any(&self, tags: &[TagId]) -> bool {
        tags.iter().any(|tag| self.might_contain(*tag))
    }

    pub fn union_with(&mut self, other: &TagFilter) {
        let merged = match (&self.0, &other.0) {
            (_, Repr::Empty) | (Repr::Saturated, _) => return,
            (_, Repr::Saturated) => Repr::Saturated,
            (Repr::Empty, Repr::Bits(bloom)) => Repr::Bits(bloom.clone()),
            (Repr::Bits(target), Repr::Bits(source)) => union_blooms(target, source)
                .map(Repr::Bits)
                .unwrap_or(Repr::Saturated),
        };
        self.0 = merged;
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.0, Repr::Empty)
    }

    fn bitmap(&self) -> Option<&[u8]> {
        match &self.0 {
            Repr::Bits(bloom) => Some(bloom.as_slice()),
            _ => None,
        }
    }
}

impl PartialEq for TagFilter {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Repr::Empty, Repr::Empty) | (Repr::Saturated, Repr::Saturated) => true,
            (Repr::Bits(_), Repr::Bits(_)) => self.bitmap() == other.bitmap(),
            _ => false,
        }
    }
}

impl Eq for TagFilter {}

impl fmt::Debug for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Empty => f.write_str("TagFilter(empty)"),
            Repr::Saturated => f.write_str("TagFilter(saturated)"),
            Repr::Bits(bloom) => {
                let set: u32 = bloom.as_slice().iter().map(|byte| byte.count_ones()).sum();
                write!(f, "TagFilter({set}/{} bits)", bloom.len())
            }
        }
    }
}

fn new_tag_bloom() -> Option<Bloom<TagId>> {
    match Bloom::new_for_fp_rate_with_seed(
        TAG_FILTER_CAPACITY,
        TAG_FILTER_FALSE_POSITIVE_RATE,
        &TAG_FILTER_SEED,
    ) {
        Ok(bloom) => Some(bloom),
        Err(err) => {
            warn!(error = err, "failed to create tag bloom filter");
            None
        }
    }
}

/// OR the bitmap of `source` into a copy of `target`. The serialized form is
/// a fixed header followed by the bitmap; only the bitmap bytes are merged.
fn union_blooms(target: &Bloom<TagId>, source: &Bloom<TagId>) -> Option<Bloom<TagId>> {
    let mut bytes = target.to_bytes();
    let source_bytes = source.as_slice();
    if bytes.len() != source_bytes.len() {
        warn!("tag bloom filters differ in size, saturating");
        return None;
    }

    let bitmap_len = (target.len() as usize).div_ceil(8);
    let header_len = bytes.len().checked_sub(bitmap_len)?;
    for (dst, src) in bytes[header_len..].iter_mut().zip(&source_bytes[header_len..]) {
        *dst |= *src;
    }

    Bloom::from_bytes(bytes)
        .inspect_err(|err| warn!(error = *err, "failed to rebuild tag bloom filter"))
        .ok()
}

/// Aggregate over a contiguous run of blocks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockSummary {
    /// Code points.
    pub total_chars: u64,
    pub total_bytes: u64,
    pub block_count: u64,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub tags_filter: TagFilter,
}

impl BlockSummary {
    /// Whether a block dated `date` could be inside this range.
    pub fn may_contain_date(&self, date: NaiveDate) -> bool {
        self.may_overlap_dates(date, date)
    }

    /// Whether any block dated within `from..=to` could be inside this range.
    pub fn may_overlap_dates(&self, from: NaiveDate, to: NaiveDate) -> bool {
        match (self.min_date, self.max_date) {
            (Some(min), Some(max)) => min <= to && from <= max,
            _ => false,
        }
    }
}

impl Summary for BlockSummary {
    fn add_summary(&mut self, other: &Self) {
        self.total_chars += other.total_chars;
        self.total_bytes += other.total_bytes;
        self.block_count += other.block_count;
        self.min_date = match (self.min_date, other.min_date) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max_date = match (self.max_date, other.max_date) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.tags_filter.union_with(&other.tags_filter);
    }
}

impl Item for TaggedBlock {
    type Summary = BlockSummary;

    fn summary(&self) -> BlockSummary {
        BlockSummary {
            total_chars: self.char_count() as u64,
            total_bytes: self.byte_count() as u64,
            block_count: 1,
            min_date: Some(self.date),
            max_date: Some(self.date),
            tags_filter: TagFilter::from_tags(&self.tags),
        }
    }
}

// ============================================================================
// Dimensions
// ============================================================================

/// Running code-point offset. Edit positions are measured in this.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Chars(pub u64);

impl Dimension<BlockSummary> for Chars {
    fn add_summary(&mut self, summary: &BlockSummary) {
        self.0 += summary.total_chars;
    }
}

impl From<usize> for Chars {
    fn from(offset: usize) -> Self {
        Chars(offset as u64)
    }
}

/// Running block index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockCount(pub u64);

impl Dimension<BlockSummary> for BlockCount {
    fn add_summary(&mut self, summary: &BlockSummary) {
        self.0 += summary.block_count;
    }
}

impl From<usize> for BlockCount {
    fn from(index: usize) -> Self {
        BlockCount(index as u64)
    }
}
