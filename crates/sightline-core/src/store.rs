//! Command surface over a persisted timeline.
//!
//! `TimelineStore` pairs a [`Timeline`] with the file it lives in and
//! exposes the operations a frontend calls. Edits save after they are
//! accepted; a failed save is logged and the edit still stands, since the
//! in-memory state stays authoritative. Tag mutations save immediately and
//! report save failures to the caller.
//!
//! The store is a single owned value. A caller serving concurrent requests
//! wraps it in a mutex and runs one command at a time.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use sightline_types::{
    BlockMetadata, DocumentSnapshot, EditPayload, EditResponse, TagDescriptor, TagSuggestion,
};
use tracing::{info, warn};

use crate::compaction::CompactionReport;
use crate::config::SightlineConfig;
use crate::error::{ApplyOpsError, PersistenceError, StoreError};
use crate::timeline::Timeline;

#[derive(Debug)]
pub struct TimelineStore {
    timeline: Timeline,
    path: PathBuf,
    max_block_chars: usize,
}

impl TimelineStore {
    /// Open the timeline at `path` with default settings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_at(path.into(), &SightlineConfig::default())
    }

    /// Open the timeline the config points at, compacting it first if the
    /// config asks for that.
    pub fn open_with_config(config: &SightlineConfig) -> Result<Self, StoreError> {
        let path = config
            .resolve_timeline_path()
            .ok_or(PersistenceError::MissingConfigDir)?;
        Self::open_at(path, config)
    }

    /// Open `path`, applying the rest of `config`.
    pub fn open_at(path: PathBuf, config: &SightlineConfig) -> Result<Self, StoreError> {
        let timeline = Timeline::load_from_path(&path)?;
        let mut store = Self {
            timeline,
            path,
            max_block_chars: config.compaction.max_block_chars,
        };
        if config.compaction.on_load {
            store.compact(None)?;
        }
        Ok(store)
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<(), StoreError> {
        Ok(self.timeline.save_to_path(&self.path)?)
    }

    // ========================================================================
    // Edits
    // ========================================================================

    /// Apply an edit batch. A stale base version is answered with
    /// [`EditResponse::Conflict`], not an error.
    pub fn apply_edit(&mut self, payload: EditPayload) -> Result<EditResponse, StoreError> {
        let EditPayload { base_version, ops } = payload;
        match self.timeline.apply_ops(base_version, &ops) {
            Ok(new_version) => {
                if let Err(err) = self.timeline.save_to_path(&self.path) {
                    warn!(error = %err, path = %self.path.display(), "failed to save timeline after edit");
                }
                Ok(EditResponse::Ok { new_version })
            }
            Err(ApplyOpsError::VersionConflict {
                current_version, ..
            }) => Ok(EditResponse::Conflict {
                server_version: current_version,
            }),
            Err(err) => Err(err.into()),
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn get_full_document(&self) -> String {
        self.timeline.content()
    }

    pub fn get_document_snapshot(&self) -> DocumentSnapshot {
        self.timeline.snapshot()
    }

    /// Text logged on `date` (`YYYY-MM-DD`).
    pub fn get_log_for_date(&self, date: &str) -> Result<String, StoreError> {
        let parsed = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| {
            StoreError::InvalidDate {
                input: date.to_string(),
            }
        })?;
        Ok(self.timeline.log_for_date(parsed))
    }

    pub fn list_blocks(&self) -> Vec<BlockMetadata> {
        self.timeline.list_blocks()
    }

    pub fn list_tags(&self) -> Vec<TagDescriptor> {
        self.timeline.list_tags()
    }

    pub fn search_prefix(&self, query: &str) -> Vec<usize> {
        self.timeline.search_prefix(query)
    }

    pub fn search_infix(&self, query: &str) -> Vec<usize> {
        self.timeline.search_infix(query)
    }

    pub fn autocomplete_tag(&self, partial: &str) -> Vec<TagSuggestion> {
        self.timeline.autocomplete_tags(partial)
    }

    // ========================================================================
    // Tag mutations
    // ========================================================================

    pub fn intern_tag(&mut self, raw: &str) -> Result<TagDescriptor, StoreError> {
        let descriptor = self.timeline.intern_tag(raw)?;
        self.save()?;
        Ok(descriptor)
    }

    pub fn assign_block_tags(
        &mut self,
        block_index: usize,
        tag_names: &[String],
    ) -> Result<Vec<TagDescriptor>, StoreError> {
        let descriptors = self.timeline.assign_block_tags(block_index, tag_names)?;
        self.save()?;
        Ok(descriptors)
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Compact with `max_block_chars`, or the configured limit, and save if
    /// anything merged.
    pub fn compact(&mut self, max_block_chars: Option<usize>) -> Result<CompactionReport, StoreError> {
        let limit = max_block_chars.unwrap_or(self.max_block_chars);
        let report = self.timeline.compact(limit);
        if report.merged() > 0 {
            info!(
                before = report.blocks_before,
                after = report.blocks_after,
                "compacted timeline"
            );
            self.save()?;
        }
        Ok(report)
    }
}
