//! Typed identifiers for blocks and tags.
//!
//! Blocks are addressed positionally inside the timeline, and positions shift
//! under every edit. `BlockId` is the edit-stable handle: allocated from a
//! per-timeline counter when a block is created and carried through splits,
//! so a caller that read `list_blocks()` can still name "that block" after
//! other edits landed.
//!
//! Tag ids are plain `u32`s handed out by the tag registry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Numeric identifier of a tag in the registry.
pub type TagId = u32;

/// Edit-stable block identifier.
///
/// `0` is reserved as "unassigned". Legacy snapshots predate block ids and
/// deserialize to it; the loader assigns real ids before the block is used.
#[derive(Clone, Copy, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(u64);

impl BlockId {
    /// Placeholder for blocks that have not been given an id yet.
    pub const UNASSIGNED: BlockId = BlockId(0);

    /// The first id a fresh timeline hands out.
    pub const FIRST: BlockId = BlockId(1);

    /// Wrap a raw counter value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw counter value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Check if this id was never assigned.
    pub const fn is_unassigned(&self) -> bool {
        self.0 == 0
    }

    /// The id allocated right after this one.
    pub const fn successor(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({})", self.0)
    }
}

/// Error from parsing a [`BlockId`] out of text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseBlockIdError(String);

impl fmt::Display for ParseBlockIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid block id '{}'", self.0)
    }
}

impl std::error::Error for ParseBlockIdError {}

impl FromStr for BlockId {
    type Err = ParseBlockIdError;

    /// Accepts both the display form (`b42`) and a bare number (`42`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('b').unwrap_or(trimmed);
        digits
            .parse::<u64>()
            .map(BlockId)
            .map_err(|_| ParseBlockIdError(s.to_string()))
    }
}

impl From<u64> for BlockId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<BlockId> for u64 {
    fn from(id: BlockId) -> u64 {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let id = BlockId::new(42);
        assert_eq!(id.to_string(), "b42");
        assert_eq!("b42".parse::<BlockId>().unwrap(), id);
        assert_eq!("42".parse::<BlockId>().unwrap(), id);
        assert!("bx".parse::<BlockId>().is_err());
    }

    #[test]
    fn test_unassigned_sentinel() {
        assert!(BlockId::default().is_unassigned());
        assert!(!BlockId::FIRST.is_unassigned());
        assert_eq!(BlockId::FIRST.successor(), BlockId::new(2));
    }

    #[test]
    fn test_serializes_as_bare_number() {
        let json = serde_json::to_string(&BlockId::new(7)).unwrap();
        assert_eq!(json, "7");
        let parsed: BlockId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, BlockId::new(7));
    }
}
