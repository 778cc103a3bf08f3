//! Path resolution utilities for permitbot
//!
//! Provides functions to locate the data directory and construct paths
//! to the files inside it.

use std::path::{Path, PathBuf};

use crate::errors::{PermitError, Result};

/// Name of the data directory created by `permitbot init`
pub const DATA_DIR_NAME: &str = ".permitbot";

/// Find the nearest directory containing a `.permitbot` data directory.
///
/// Walks up the directory tree from the starting directory.
///
/// # Errors
/// * `ConfigError` - If no data directory is found
pub fn find_data_dir(start_cwd: &Path) -> Result<PathBuf> {
    let mut current = start_cwd
        .canonicalize()
        .map_err(|e| PermitError::ConfigError(format!("Cannot resolve path: {}", e)))?;

    loop {
        let candidate = current.join(DATA_DIR_NAME);
        if candidate.is_dir() {
            return Ok(candidate);
        }

        match current.parent() {
            Some(parent) if parent != current => {
                current = parent.to_path_buf();
            }
            _ => {
                return Err(PermitError::ConfigError(format!(
                    "Could not find a {} directory; run `permitbot init` first",
                    DATA_DIR_NAME
                )));
            }
        }
    }
}

/// Resolve the current working directory, optionally using an override.
pub fn resolve_cwd(cwd_option: Option<&Path>) -> PathBuf {
    match cwd_option {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Get the path to the data directory under `root`.
pub fn get_data_dir(root: &Path) -> PathBuf {
    root.join(DATA_DIR_NAME)
}

/// Get the path to the config.json file.
pub fn get_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.json")
}

/// Get the path to the store's state.json file.
pub fn get_state_path(data_dir: &Path) -> PathBuf {
    data_dir.join("state.json")
}

/// Get the directory transport file handles resolve against.
pub fn get_file_root(data_dir: &Path, file_root: &str) -> PathBuf {
    let configured = Path::new(file_root);
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        data_dir.join(configured)
    }
}
