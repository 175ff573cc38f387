//! Editor configuration persistence
//!
//! Stores user preferences in `~/.config/markon/config.yaml`. Every field has a
//! default, so a partial (or missing) file is always valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Slot name the document is persisted under
pub const DEFAULT_STORAGE_SLOT: &str = "markon-content";

/// Scroll synchronization timings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Enable sync when the preview opens
    pub enabled: bool,
    /// Quiet period before a burst of scroll events triggers a sync
    pub debounce_ms: u64,
    /// Cooldown after a sync during which self-generated scrolls are ignored
    pub settle_ms: u64,
    /// Distance below the preview's top edge used to pick the visible element
    pub probe_offset_px: f32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 50,
            settle_ms: 300,
            probe_offset_px: 20.0,
        }
    }
}

impl SyncConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Document persistence settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Fixed slot the single document is stored under
    pub slot: String,
    /// Quiet period the worker waits for before writing a save
    pub save_debounce_ms: u64,
    /// Override for the slot file location (defaults to the data dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            slot: DEFAULT_STORAGE_SLOT.to_string(),
            save_debounce_ms: 300,
            path: None,
        }
    }
}

impl StorageConfig {
    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    /// Resolved slot file location
    pub fn store_path(&self) -> Option<PathBuf> {
        self.path
            .clone()
            .or_else(crate::config_paths::store_file)
    }
}

/// Preview pane layout settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Line height used by the estimated preview layout
    pub line_height: f32,
    /// Lines kept above a line scrolled to in the source view
    pub scroll_margin_lines: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            line_height: 20.0,
            scroll_margin_lines: 1,
        }
    }
}

/// Editor configuration that persists across sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub sync: SyncConfig,
    pub storage: StorageConfig,
    pub preview: PreviewConfig,
}

impl EditorConfig {
    /// Load config from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };

        Self::load_from(&path)
    }

    /// Load config from an explicit path, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save config to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write config to {}: {}", path.display(), e))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_sync_timings() {
        let config = EditorConfig::default();
        assert_eq!(config.sync.debounce(), Duration::from_millis(50));
        assert_eq!(config.sync.settle(), Duration::from_millis(300));
        assert_eq!(config.sync.probe_offset_px, 20.0);
        assert_eq!(config.storage.slot, DEFAULT_STORAGE_SLOT);
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let yaml = "sync:\n  settle_ms: 500\n";
        let config: EditorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sync.settle_ms, 500);
        assert_eq!(config.sync.debounce_ms, 50);
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_explicit_store_path_wins() {
        let storage = StorageConfig {
            path: Some(PathBuf::from("/tmp/markon-test.json")),
            ..StorageConfig::default()
        };
        assert_eq!(
            storage.store_path(),
            Some(PathBuf::from("/tmp/markon-test.json"))
        );
    }
}
