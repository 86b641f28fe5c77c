//! Error types for timeline operations.

use std::io;
use std::path::PathBuf;

use sightline_types::{BlockId, TagId};
use thiserror::Error;

/// Rejection of an edit batch. The timeline is unchanged when this is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyOpsError {
    /// The caller's base version is stale. Refetch and retry.
    #[error("version conflict: document is at {current_version}, edit was based on {base_version}")]
    VersionConflict {
        current_version: u64,
        base_version: u64,
    },

    /// Insert position beyond the end of the document.
    #[error("invalid position {position} for document of length {len}")]
    InvalidPosition { position: usize, len: usize },

    /// Delete range reversed or reaching past the end of the document.
    #[error("invalid range {start}..{end} for document of length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },
}

/// Failure to turn user input into a registry tag.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InternTagError {
    #[error("tag name cannot be empty")]
    Empty,

    #[error("tag must contain at least one valid segment")]
    Invalid,

    /// Registry inconsistency: an interned id has no resolvable name.
    #[error("failed to resolve canonical name for tag id {0}")]
    MissingName(TagId),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssignBlockTagsError {
    /// The index no longer names a block, usually because edits shifted it.
    #[error("block index {index} out of range ({block_count} blocks)")]
    UnknownBlock { index: usize, block_count: usize },

    #[error("no block with id {0}")]
    UnknownBlockId(BlockId),

    #[error(transparent)]
    Intern(#[from] InternTagError),
}

/// Snapshot load/save failures.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("config directory unavailable")]
    MissingConfigDir,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed timeline snapshot: {0}")]
    Serde(#[from] serde_json::Error),
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Config file failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config directory unavailable")]
    MissingConfigDir,

    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Errors surfaced by [`crate::TimelineStore`] commands.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Apply(#[from] ApplyOpsError),

    #[error(transparent)]
    Intern(#[from] InternTagError),

    #[error(transparent)]
    Assign(#[from] AssignBlockTagsError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid date '{input}': expected YYYY-MM-DD")]
    InvalidDate { input: String },
}
