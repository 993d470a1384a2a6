//! Device-scoped key/value storage.
//!
//! Holds small per-device values such as the cached device id and the key
//! of the license this device last activated. Values here are hints; the
//! record store is authoritative.

use crate::error::{StorageError, StorageResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Synchronous string key/value storage local to one device.
pub trait DeviceStorage: Send + Sync {
    /// Returns the value stored under `name`.
    fn get_item(&self, name: &str) -> StorageResult<Option<String>>;

    /// Stores `value` under `name`, replacing any previous value.
    fn set_item(&self, name: &str, value: &str) -> StorageResult<()>;

    /// Removes `name`. Missing names are not an error.
    fn remove_item(&self, name: &str) -> StorageResult<()>;
}

/// Device storage held in process memory.
#[derive(Debug, Default)]
pub struct MemoryDeviceStorage {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryDeviceStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeviceStorage for MemoryDeviceStorage {
    fn get_item(&self, name: &str) -> StorageResult<Option<String>> {
        let items = self.items.lock().map_err(|_| StorageError::LockPoisoned)?;
        Ok(items.get(name).cloned())
    }

    fn set_item(&self, name: &str, value: &str) -> StorageResult<()> {
        let mut items = self.items.lock().map_err(|_| StorageError::LockPoisoned)?;
        items.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, name: &str) -> StorageResult<()> {
        let mut items = self.items.lock().map_err(|_| StorageError::LockPoisoned)?;
        items.remove(name);
        Ok(())
    }
}

/// Device storage persisted as a JSON object in a single file.
///
/// The file is loaded once on open and rewritten on every change. Writes
/// go to a sibling temp file that is renamed into place, so a crash never
/// leaves a half-written file behind.
#[derive(Debug)]
pub struct FileDeviceStorage {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileDeviceStorage {
    /// Opens (or creates on first write) the storage file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let items = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), entries = items.len(), "opened device storage");
        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(items)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl DeviceStorage for FileDeviceStorage {
    fn get_item(&self, name: &str) -> StorageResult<Option<String>> {
        let items = self.items.lock().map_err(|_| StorageError::LockPoisoned)?;
        Ok(items.get(name).cloned())
    }

    fn set_item(&self, name: &str, value: &str) -> StorageResult<()> {
        let mut items = self.items.lock().map_err(|_| StorageError::LockPoisoned)?;
        let previous = items.insert(name.to_string(), value.to_string());
        if let Err(e) = self.persist(&items) {
            // Keep memory in line with what is on disk.
            match previous {
                Some(old) => items.insert(name.to_string(), old),
                None => items.remove(name),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&self, name: &str) -> StorageResult<()> {
        let mut items = self.items.lock().map_err(|_| StorageError::LockPoisoned)?;
        let Some(previous) = items.remove(name) else {
            return Ok(());
        };
        if let Err(e) = self.persist(&items) {
            items.insert(name.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }
}
