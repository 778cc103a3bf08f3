//! JSON file operations with schema validation
//!
//! Provides functions to read and write JSON files with serde validation.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::{PermitError, Result};
use crate::schemas::Config;

use super::paths::get_config_path;

/// Read and deserialize a JSON file.
///
/// # Errors
/// * `NotFound` - If the file does not exist
/// * `InvalidJson` - If the file contains invalid JSON or does not match the schema
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PermitError::NotFound(format!("File not found: {}", path.display()))
        } else {
            PermitError::Io(e)
        }
    })?;

    serde_json::from_str(&content).map_err(|e| {
        PermitError::InvalidJson(format!("Invalid JSON in file {}: {}", path.display(), e))
    })
}

/// Write a value to a JSON file with pretty formatting.
///
/// Uses atomic write (write to temp file, then rename) to avoid partial writes.
pub fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let content =
        serde_json::to_string_pretty(data).map_err(|e| PermitError::InvalidJson(e.to_string()))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("json.tmp");
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(content.as_bytes())?;
    file.write_all(b"\n")?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Read the config.json file from a data directory.
///
/// Returns the default configuration if the file doesn't exist.
pub fn read_config(data_dir: &Path) -> Result<Config> {
    let path = get_config_path(data_dir);
    if !path.exists() {
        return Ok(Config::default());
    }
    read_json(&path).map_err(|e| match e {
        PermitError::InvalidJson(msg) => PermitError::ConfigError(msg),
        other => other,
    })
}

/// Write the config.json file into a data directory.
pub fn write_config(data_dir: &Path, config: &Config) -> Result<()> {
    write_json(&get_config_path(data_dir), config)
}
