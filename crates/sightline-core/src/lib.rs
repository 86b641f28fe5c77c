//! Versioned timeline storage engine for Sightline.
//!
//! The journal is one growing document held as an ordered sequence of dated,
//! tagged blocks in a summary tree. Every tree node caches a [`BlockSummary`]
//! (code points, bytes, block count, date span, tag Bloom filter), so editing
//! at an offset, finding a date's entries and scanning for a tag all walk
//! O(log n) nodes instead of the whole document.
//!
//! # Architecture
//!
//! ```text
//! TimelineStore ─── file path, save-after-mutate
//!     └── Timeline ─── version counter, block id counter
//!             ├── SumTree<TaggedBlock> ─── nodes cache BlockSummary
//!             │       └── Cursor<Chars | BlockCount> ─── seek / slice / suffix
//!             └── TagRegistry ─── (parent, segment) → TagId
//! ```
//!
//! # Edit Protocol
//!
//! Edits are optimistic: a batch names the version it was computed against
//! and is rejected with [`ApplyOpsError::VersionConflict`] if the timeline
//! has moved on. An accepted batch bumps the version by exactly one.
//!
//! | Operation                         | Effect                                      |
//! |-----------------------------------|---------------------------------------------|
//! | `Insert { position, text }`       | New block at `position`, splitting if inside |
//! | `Delete { start, end }`           | Removes code points, keeping partial blocks |
//! | `assign_block_tags(index, names)` | Replaces one block's tag set                 |
//! | `compact(max_chars)`              | Merges same-date, same-tag neighbours        |

pub mod compaction;
pub mod config;
mod error;
pub mod persistence;
mod search;
mod store;
pub mod sum_tree;
pub mod summary;
pub mod tag_registry;
mod timeline;

pub use compaction::{CompactionReport, DEFAULT_MAX_BLOCK_CHARS};
pub use config::{CompactionConfig, SightlineConfig};
pub use error::{
    ApplyOpsError, AssignBlockTagsError, ConfigError, InternTagError, PersistenceError, StoreError,
};
pub use persistence::storage_path;
pub use store::TimelineStore;
pub use sum_tree::{Bias, Cursor, SumTree};
pub use summary::{BlockCount, BlockSummary, Chars, TagFilter};
pub use tag_registry::TagRegistry;
pub use timeline::Timeline;
