//! Configuration loaded from `config.ron`.
//!
//! Lives at `<config_dir>/sightline/config.ron` unless `SIGHTLINE_CONFIG`
//! points elsewhere. Every field is optional:
//!
//! ```ron
//! (
//!     timeline_path: Some("/home/me/notes/timeline.json"),
//!     compaction: (max_block_chars: 2048, on_load: true),
//! )
//! ```

use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::compaction::DEFAULT_MAX_BLOCK_CHARS;
use crate::error::ConfigError;

/// Overrides the timeline file location, ahead of the config file.
pub const TIMELINE_PATH_ENV: &str = "SIGHTLINE_TIMELINE_PATH";

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "SIGHTLINE_CONFIG";

const APP_DIR: &str = "sightline";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SightlineConfig {
    /// Timeline snapshot location. Defaults to
    /// `<config_dir>/sightline/timeline.json`.
    pub timeline_path: Option<PathBuf>,
    pub compaction: CompactionConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionConfig {
    /// Merged blocks stay within this many code points.
    pub max_block_chars: usize,
    /// Compact right after loading the timeline.
    pub on_load: bool,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            max_block_chars: DEFAULT_MAX_BLOCK_CHARS,
            on_load: false,
        }
    }
}

impl SightlineConfig {
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => Self::from_ron(&text),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load from the standard location.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path().ok_or(ConfigError::MissingConfigDir)?;
        Self::load_from_path(path)
    }

    /// [`Self::load`], falling back to defaults with a warning.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|err| {
            warn!(error = %err, "ignoring unreadable config, using defaults");
            Self::default()
        })
    }

    /// Where the timeline snapshot lives: `SIGHTLINE_TIMELINE_PATH`, then
    /// `timeline_path`, then the platform config directory.
    pub fn resolve_timeline_path(&self) -> Option<PathBuf> {
        resolve_timeline_path(
            env::var_os(TIMELINE_PATH_ENV).map(PathBuf::from),
            self.timeline_path.as_deref(),
            dirs::config_dir(),
        )
    }
}

/// `SIGHTLINE_CONFIG`, or `<config_dir>/sightline/config.ron`.
pub fn config_path() -> Option<PathBuf> {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .or_else(|| dirs::config_dir().map(|p| p.join(APP_DIR).join("config.ron")))
}

fn resolve_timeline_path(
    env_override: Option<PathBuf>,
    configured: Option<&Path>,
    config_dir: Option<PathBuf>,
) -> Option<PathBuf> {
    env_override
        .filter(|path| !path.as_os_str().is_empty())
        .or_else(|| configured.map(Path::to_path_buf))
        .or_else(|| config_dir.map(|p| p.join(APP_DIR).join("timeline.json")))
}
