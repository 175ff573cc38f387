//! Where markon keeps its files
//!
//! - `config.yaml`: sync, preview and storage settings, in the config dir
//!   (`$XDG_CONFIG_HOME/markon` or `~/.config/markon`, `%APPDATA%\markon`
//!   on Windows)
//! - `logs/markon.log*`: daily log files, also in the config dir
//! - `documents.json`: the saved document of every storage slot, in the
//!   platform data dir (`~/.local/share/markon` on Linux), or the config dir
//!   when the platform has none

use std::{
    env, fs,
    path::{Path, PathBuf},
};

const APP_DIR: &str = "markon";

/// File name of the slot store inside the data directory
pub const STORE_FILE: &str = "documents.json";

/// Directory holding `config.yaml` and `logs/`
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join(APP_DIR))
    }

    #[cfg(not(target_os = "windows"))]
    {
        env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .map(|config| config.join(APP_DIR))
    }
}

/// Settings read by `EditorConfig::load`
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.yaml"))
}

/// Directory holding the slot store
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .or_else(config_dir)
}

/// Default slot store used by the storage worker
pub fn store_file() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join(STORE_FILE))
}

fn ensure_dir(path: &Path) -> Result<(), String> {
    fs::create_dir_all(path)
        .map_err(|e| format!("Failed to create directory {}: {}", path.display(), e))
}

/// Create the config dir if missing
pub fn ensure_config_dir() -> Result<PathBuf, String> {
    let dir = config_dir().ok_or_else(|| "No config directory available".to_string())?;
    ensure_dir(&dir)?;
    Ok(dir)
}

/// Create `logs/` under the config dir for the daily log file
pub fn ensure_logs_dir() -> Result<PathBuf, String> {
    let config = ensure_config_dir()?;
    let logs = config.join("logs");
    ensure_dir(&logs)?;
    Ok(logs)
}
