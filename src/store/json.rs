//! File-backed store
//!
//! Every operation reloads `state.json` while holding a lock on the sidecar
//! `state.json.lock`: shared for reads, exclusive for mutations. A mutation is
//! applied to the freshly loaded tables and written back before the lock is
//! released, so separate processes sharing one data directory see each other's
//! changes and cannot both pass the same status gate.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::errors::{PermitError, Result};
use crate::fs::{read_json, write_json};

use super::{StoreData, TableStore};

/// Store persisted to a single JSON file
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    lock_path: PathBuf,
}

/// Sidecar lock path: `state.json` locks through `state.json.lock`.
fn lock_path_for(path: &Path) -> PathBuf {
    let mut lock_path = path.to_path_buf();
    let ext = match path.extension() {
        Some(ext) => format!("{}.lock", ext.to_string_lossy()),
        None => "lock".to_string(),
    };
    lock_path.set_extension(ext);
    lock_path
}

/// Held lock on the sidecar file; released when the file is closed.
struct StateLock {
    _file: File,
}

impl JsonStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    ///
    /// # Errors
    /// * `InvalidJson` - If the file exists but cannot be parsed
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let store = JsonStore {
            lock_path: lock_path_for(&path),
            path,
        };
        let (employees, permits) = store.read(|d| (d.employees.len(), d.permits.len()))?;
        debug!(path = %store.path.display(), employees, permits, "opened store");
        Ok(store)
    }

    fn lock(&self, exclusive: bool) -> Result<StateLock> {
        if let Some(parent) = self.lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|e| {
                PermitError::Store(format!(
                    "cannot open lock file {}: {}",
                    self.lock_path.display(),
                    e
                ))
            })?;

        let locked = if exclusive {
            file.lock_exclusive()
        } else {
            file.lock_shared()
        };
        locked.map_err(|e| {
            PermitError::Store(format!("cannot lock {}: {}", self.lock_path.display(), e))
        })?;
        Ok(StateLock { _file: file })
    }

    fn load(&self) -> Result<StoreData> {
        match read_json::<StoreData>(&self.path) {
            Ok(data) => Ok(data),
            Err(PermitError::NotFound(_)) => Ok(StoreData::default()),
            Err(e) => Err(e),
        }
    }
}

impl TableStore for JsonStore {
    fn read<T>(&self, f: impl FnOnce(&StoreData) -> T) -> Result<T> {
        let _lock = self.lock(false)?;
        let data = self.load()?;
        Ok(f(&data))
    }

    fn write<T>(&self, f: impl FnOnce(&mut StoreData) -> Result<T>) -> Result<T> {
        let _lock = self.lock(true)?;
        let current = self.load()?;

        let mut next = current.clone();
        let value = f(&mut next)?;
        if next != current {
            write_json(&self.path, &next)
                .map_err(|e| PermitError::wrap(e, format!("writing {}", self.path.display())))?;
        }
        Ok(value)
    }
}
