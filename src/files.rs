//! Transport file access
//!
//! Evidence photos are referenced by opaque file handles. A [`FileSource`]
//! resolves a handle to image bytes through a scoped local download that is
//! deleted when dropped.

use std::io::{Read, Seek, SeekFrom};
use std::path::{Component, Path, PathBuf};

use tempfile::NamedTempFile;

use crate::errors::{PermitError, Result};

/// A downloaded file, removed from disk when dropped
#[derive(Debug)]
pub struct ScopedDownload {
    file: NamedTempFile,
}

impl ScopedDownload {
    pub fn new(file: NamedTempFile) -> Self {
        ScopedDownload { file }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Read the whole download into memory.
    pub fn bytes(&mut self) -> Result<Vec<u8>> {
        let handle = self.file.as_file_mut();
        handle.seek(SeekFrom::Start(0))?;
        let mut buffer = Vec::new();
        handle.read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}

/// Where evidence photo handles resolve
pub trait FileSource: Send + Sync {
    /// Whether the handle names an existing file
    fn contains(&self, handle: &str) -> bool;

    /// Download the file behind `handle` into a scoped temporary file.
    fn download(&self, handle: &str) -> Result<ScopedDownload>;
}

/// Handles are paths relative to a root directory
#[derive(Debug, Clone)]
pub struct LocalFileSource {
    root: PathBuf,
}

impl LocalFileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalFileSource { root: root.into() }
    }

    /// Resolve a handle under the root, refusing anything that escapes it.
    pub fn resolve(&self, handle: &str) -> Result<PathBuf> {
        let relative = Path::new(handle);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if handle.is_empty() || escapes {
            return Err(PermitError::InvalidInput(format!(
                "File handle must be a relative path inside the file root: {}",
                handle
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl FileSource for LocalFileSource {
    fn contains(&self, handle: &str) -> bool {
        self.resolve(handle).map(|p| p.is_file()).unwrap_or(false)
    }

    fn download(&self, handle: &str) -> Result<ScopedDownload> {
        let source = self.resolve(handle)?;
        let mut input = std::fs::File::open(&source).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PermitError::NotFound(format!("File not found: {}", handle))
            } else {
                PermitError::Io(e)
            }
        })?;

        let mut file = tempfile::Builder::new()
            .prefix("permitbot-photo-")
            .tempfile()?;
        std::io::copy(&mut input, file.as_file_mut())?;
        Ok(ScopedDownload { file })
    }
}
