//! Configuration system tests
//!
//! Tests for config paths and editor config loading/saving.

use std::time::Duration;

use markon::config::{EditorConfig, DEFAULT_STORAGE_SLOT};
use markon::config_paths;
use markon::storage::PersistenceOptions;
use tempfile::TempDir;

// ========================================================================
// Config Paths Tests
// ========================================================================

#[test]
fn test_config_file_ends_with_yaml() {
    if let Some(path) = config_paths::config_file() {
        assert_eq!(path.file_name().unwrap(), "config.yaml");
        assert!(path.to_string_lossy().contains("markon"));
    }
}

#[test]
fn test_store_file_lives_under_markon_dir() {
    if let Some(path) = config_paths::store_file() {
        assert_eq!(path.file_name().unwrap(), config_paths::STORE_FILE);
        assert_eq!(path.parent().unwrap().file_name().unwrap(), "markon");
    }
}

// ========================================================================
// EditorConfig Tests
// ========================================================================

#[test]
fn test_missing_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let config = EditorConfig::load_from(&dir.path().join("absent.yaml"));
    assert_eq!(config, EditorConfig::default());
}

#[test]
fn test_malformed_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "sync: [not, a, map").unwrap();
    assert_eq!(EditorConfig::load_from(&path), EditorConfig::default());
}

#[test]
fn test_save_then_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.yaml");

    let mut config = EditorConfig::default();
    config.sync.settle_ms = 450;
    config.storage.slot = "scratch".to_string();
    config.preview.line_height = 24.0;
    config.save_to(&path).unwrap();

    let loaded = EditorConfig::load_from(&path);
    assert_eq!(loaded, config);
    assert_eq!(loaded.sync.settle(), Duration::from_millis(450));
}

#[test]
fn test_persistence_options_follow_storage_config() {
    let yaml = "storage:\n  save_debounce_ms: 1000\n";
    let config: EditorConfig = serde_yaml::from_str(yaml).unwrap();

    let options = PersistenceOptions::from_config(&config.storage, true);
    assert_eq!(options.slot, DEFAULT_STORAGE_SLOT);
    assert_eq!(options.save_debounce, Duration::from_secs(1));
    assert!(options.external_boot_content);
}
