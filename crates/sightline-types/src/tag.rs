//! Tag vocabulary: registry entries, resolved descriptors, suggestions, and
//! the colour palette.
//!
//! Tags are hierarchical. Each registry entry holds a single path segment and
//! an optional parent link; the display name `project:sightline` is the
//! colon-joined chain from the root ancestor down.

use serde::{Deserialize, Serialize};

use crate::ids::TagId;

/// One registry entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    /// A single path segment (never contains `:`).
    pub name: String,
    pub parent_id: Option<TagId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A tag resolved to its full display name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDescriptor {
    pub id: TagId,
    /// `#`-prefixed full path, e.g. `#project:sightline`.
    pub name: String,
    pub color: String,
}

/// Autocomplete row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSuggestion {
    /// `#`-prefixed full path.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Synthesized "create this tag" row: no tag by this name exists yet.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_new: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl TagSuggestion {
    /// Suggestion for an existing tag.
    pub fn existing(name: impl Into<String>, color: Option<String>) -> Self {
        Self {
            name: name.into(),
            color,
            is_new: false,
        }
    }

    /// Suggestion offering to create a tag that does not exist yet.
    pub fn create(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
            is_new: true,
        }
    }
}

// ============================================================================
// Palette
// ============================================================================

/// Tag highlight colours in CSS OKLCH notation so a frontend can apply them
/// directly.
const PALETTE: [&str; 16] = [
    "oklch(0.78 0.20 25)",
    "oklch(0.80 0.19 55)",
    "oklch(0.82 0.18 90)",
    "oklch(0.83 0.17 120)",
    "oklch(0.82 0.16 150)",
    "oklch(0.80 0.17 180)",
    "oklch(0.79 0.18 210)",
    "oklch(0.78 0.19 235)",
    "oklch(0.77 0.20 260)",
    "oklch(0.78 0.19 285)",
    "oklch(0.80 0.18 310)",
    "oklch(0.81 0.18 330)",
    "oklch(0.83 0.17 345)",
    "oklch(0.84 0.16 10)",
    "oklch(0.82 0.18 40)",
    "oklch(0.79 0.19 70)",
];

/// Deterministic colour for a tag id.
#[inline]
pub fn color_for(id: TagId) -> &'static str {
    PALETTE[(id as usize) % PALETTE.len()]
}
