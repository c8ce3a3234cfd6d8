//! Interaction settings persistence
//!
//! Stores user preferences in `~/.config/trackline/config.yaml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keymap::{Platform, DEFAULT_CHORD_TIMEOUT};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config directory available")]
    NoConfigDir,
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write config to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Keyboard interaction settings that persist across sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionConfig {
    /// Maximum gap between chord keys, in milliseconds
    #[serde(default = "default_chord_timeout_ms")]
    pub chord_timeout_ms: u64,
    /// Force Mac or non-Mac modifier roles instead of detecting them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    /// User keymap merged over the defaults; `keymap.yaml` next to this file
    /// when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keymap: Option<PathBuf>,
}

fn default_chord_timeout_ms() -> u64 {
    DEFAULT_CHORD_TIMEOUT.as_millis() as u64
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            chord_timeout_ms: default_chord_timeout_ms(),
            platform: None,
            keymap: None,
        }
    }
}

impl InteractionConfig {
    /// Load config from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };

        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Save config to the default location
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = crate::config_paths::config_file().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn chord_timeout(&self) -> Duration {
        Duration::from_millis(self.chord_timeout_ms)
    }

    /// Platform override, or the detected one
    pub fn platform(&self) -> Platform {
        self.platform.unwrap_or_else(Platform::current)
    }

    /// User keymap location, if any can be determined
    pub fn keymap_path(&self) -> Option<PathBuf> {
        self.keymap
            .clone()
            .or_else(crate::config_paths::keymap_file)
    }
}
