//! Shared block, tag and edit types for Sightline.
//!
//! This crate is the vocabulary shared by the storage engine and everything
//! that talks to it: block identity, tagged blocks, tags, and the edit
//! protocol's wire types. It has no internal sightline dependencies.
//!
//! # Overview
//!
//! ```text
//! Timeline (one per journal)
//!     └── ordered TaggedBlocks (BlockId + date + text + tag ids)
//!     └── Tag registry (TagId → name segment + parent link + colour)
//!
//! Caller ──EditPayload { base_version, ops }──▶ Timeline
//!        ◀──EditResponse::Ok { new_version } | Conflict { server_version }──
//! ```
//!
//! # Key Types
//!
//! |---------------------|---------------------------------------------------|
//! | Type                | Purpose                                           |
//! |---------------------|---------------------------------------------------|
//! | [`BlockId`]         | Edit-stable block handle (survives index shifts)  |
//! | [`TaggedBlock`]     | Leaf item: date, text payload, tag ids            |
//! | [`BlockMetadata`]   | Read-model row for UI alignment                   |
//! | [`Tag`]             | One registry entry (single path segment)          |
//! | [`TagDescriptor`]   | Resolved tag: id, `#full:name`, colour            |
//! | [`TagSuggestion`]   | Autocomplete row                                  |
//! | [`TextOperation`]   | Code-point offset insert/delete                   |
//! | [`EditPayload`]     | Batch of operations + expected base version       |
//! | [`EditResponse`]    | Accepted (new version) or conflict                |
//! |---------------------|---------------------------------------------------|

pub mod block;
pub mod ids;
pub mod ops;
pub mod tag;

// Re-export primary types at crate root for convenience.
pub use block::{BlockMetadata, TaggedBlock};
pub use ids::{BlockId, ParseBlockIdError, TagId};
pub use ops::{DocumentSnapshot, EditPayload, EditResponse, TextOperation};
pub use tag::{Tag, TagDescriptor, TagSuggestion, color_for};
