//! Timeline snapshots on disk.
//!
//! ```json
//! {
//!   "version": 12,
//!   "next_block_id": 40,
//!   "blocks": [{ "id": 1, "date": "2024-06-01", "text": "...", "tags": [0] }],
//!   "tag_registry": [{ "id": 0, "name": "project", "parent_id": null, "color": "oklch(...)" }]
//! }
//! ```
//!
//! Older files may call `blocks` `entries`, omit block ids, or store the
//! registry as a flat `{"<id>": "a:b"}` map. All of these still load.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sightline_types::{BlockId, Tag, TagId, TaggedBlock};
use tracing::{debug, warn};

use crate::config::SightlineConfig;
use crate::error::PersistenceError;
use crate::tag_registry::TagRegistry;
use crate::timeline::Timeline;

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum TagRegistrySnapshot {
    Hierarchical(Vec<Tag>),
    Flat(HashMap<String, String>),
}

#[derive(Debug, Serialize, Deserialize)]
struct TimelineSnapshot {
    #[serde(default)]
    version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_block_id: Option<BlockId>,
    #[serde(alias = "entries")]
    blocks: Vec<TaggedBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tag_registry: Option<TagRegistrySnapshot>,
}

impl TagRegistrySnapshot {
    fn into_registry(self) -> TagRegistry {
        match self {
            TagRegistrySnapshot::Hierarchical(tags) => TagRegistry::from_tags(tags),
            TagRegistrySnapshot::Flat(map) => {
                let parsed: HashMap<TagId, String> = map
                    .into_iter()
                    .filter_map(|(id, path)| match id.trim().parse::<TagId>() {
                        Ok(id) => Some((id, path)),
                        Err(_) => {
                            warn!(id = %id, "skipping legacy tag with non-numeric id");
                            None
                        }
                    })
                    .collect();
                TagRegistry::from_map(parsed)
            }
        }
    }
}

/// Timeline file location per config and environment.
pub fn storage_path() -> Result<PathBuf, PersistenceError> {
    SightlineConfig::load_or_default()
        .resolve_timeline_path()
        .ok_or(PersistenceError::MissingConfigDir)
}

impl Timeline {
    /// Serialize the full state as pretty JSON.
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        let tags = self.registry.export();
        let snapshot = TimelineSnapshot {
            version: self.version,
            next_block_id: Some(self.next_block_id),
            blocks: self.tree.items(),
            tag_registry: (!tags.is_empty()).then_some(TagRegistrySnapshot::Hierarchical(tags)),
        };
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        let snapshot: TimelineSnapshot = serde_json::from_str(json)?;
        let registry = snapshot
            .tag_registry
            .map(TagRegistrySnapshot::into_registry)
            .unwrap_or_default();
        Ok(Self::restore(
            snapshot.blocks,
            registry,
            snapshot.version,
            snapshot.next_block_id,
        ))
    }

    /// Write the snapshot to `path`, creating parent directories.
    ///
    /// The file is replaced atomically: a reader sees either the old snapshot
    /// or the new one, never a partial write.
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
        }

        let json = self.to_json()?;
        let tmp = temp_path_for(path);
        fs::write(&tmp, json).map_err(|e| PersistenceError::io(&tmp, e))?;
        if let Err(err) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(PersistenceError::io(path, err));
        }

        debug!(path = %path.display(), version = self.version, "saved timeline");
        Ok(())
    }

    /// Read a snapshot from `path`. A missing file is an empty timeline.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(json) => {
                let timeline = Self::from_json(&json)?;
                debug!(
                    path = %path.display(),
                    version = timeline.version,
                    blocks = timeline.block_count(),
                    "loaded timeline"
                );
                Ok(timeline)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no timeline file, starting empty");
                Ok(Self::default())
            }
            Err(err) => Err(PersistenceError::io(path, err)),
        }
    }

    /// Save to [`storage_path`].
    pub fn save(&self) -> Result<(), PersistenceError> {
        self.save_to_path(storage_path()?)
    }

    /// Load from [`storage_path`].
    pub fn load() -> Result<Self, PersistenceError> {
        Self::load_from_path(storage_path()?)
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "timeline".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}
