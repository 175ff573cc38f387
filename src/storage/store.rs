//! Durable slot stores
//!
//! A store maps a slot name to the last saved document. [`FileStore`] keeps
//! every slot in one versioned JSON file; [`MemoryStore`] is a shared map used
//! by tests and embedders that persist elsewhere.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const STORE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no storage location available")]
    Unavailable,
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed store file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported store version {0}")]
    UnsupportedVersion(u32),
    #[error("failed to start storage worker: {0}")]
    Spawn(#[source] io::Error),
}

/// Slot storage owned by the worker thread
pub trait DocumentStore: Send + 'static {
    /// Stored content for `slot`, `None` when never saved
    fn read(&mut self, slot: &str) -> Result<Option<String>, StorageError>;

    fn write(&mut self, slot: &str, content: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SlotRecord {
    content: String,
    /// Unix seconds
    saved_at: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    slots: BTreeMap<String, SlotRecord>,
}

impl Default for StoreFile {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            slots: BTreeMap::new(),
        }
    }
}

/// JSON slot file, rewritten atomically on every save
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    file: StoreFile,
}

impl FileStore {
    /// Open (or prepare to create) the store at `path`.
    ///
    /// Fails when the parent directory cannot be created or an existing file
    /// cannot be parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let file = match fs::read_to_string(&path) {
            Ok(text) => Self::parse(&path, &text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => StoreFile::default(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        tracing::debug!(
            path = %path.display(),
            slots = file.slots.len(),
            "Opened document store"
        );
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(path: &Path, text: &str) -> Result<StoreFile, StorageError> {
        if text.trim().is_empty() {
            return Ok(StoreFile::default());
        }
        let file: StoreFile =
            serde_json::from_str(text).map_err(|source| StorageError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;
        if file.version != STORE_VERSION {
            return Err(StorageError::UnsupportedVersion(file.version));
        }
        Ok(file)
    }

    fn persist(&self) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        let json = serde_json::to_string_pretty(&self.file)
            .map_err(|e| io_err(io::Error::new(io::ErrorKind::InvalidData, e)))?;

        // Write beside the target then rename so readers never see a torn file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl DocumentStore for FileStore {
    fn read(&mut self, slot: &str) -> Result<Option<String>, StorageError> {
        Ok(self.file.slots.get(slot).map(|r| r.content.clone()))
    }

    fn write(&mut self, slot: &str, content: &str) -> Result<(), StorageError> {
        let saved_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.file.slots.insert(
            slot.to_string(),
            SlotRecord {
                content: content.to_string(),
                saved_at,
            },
        );
        self.persist()?;
        tracing::debug!(slot, bytes = content.len(), "Wrote slot to disk");
        Ok(())
    }
}

/// In-memory store; clones share the same slots
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
    writes: Arc<Mutex<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(slot: &str, content: &str) -> Self {
        let store = Self::default();
        if let Ok(mut slots) = store.slots.lock() {
            slots.insert(slot.to_string(), content.to_string());
        }
        store
    }

    /// Snapshot of a slot, for inspection
    pub fn get(&self, slot: &str) -> Option<String> {
        self.slots.lock().ok()?.get(slot).cloned()
    }

    /// Number of writes performed so far
    pub fn write_count(&self) -> usize {
        self.writes.lock().map(|w| *w).unwrap_or(0)
    }
}

impl DocumentStore for MemoryStore {
    fn read(&mut self, slot: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(slot))
    }

    fn write(&mut self, slot: &str, content: &str) -> Result<(), StorageError> {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(slot.to_string(), content.to_string());
        }
        if let Ok(mut writes) = self.writes.lock() {
            *writes += 1;
        }
        Ok(())
    }
}
