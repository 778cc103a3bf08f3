//! Configuration loading with defaults

use std::path::Path;

use crate::errors::{PermitError, Result};
use crate::fs;
use crate::schemas::Config;

/// Load configuration from the data directory, falling back to defaults.
///
/// If config.json exists, it will be read and merged with defaults.
/// The result is validated before it is returned.
pub fn load_config(data_dir: &Path) -> Result<Config> {
    let config = fs::read_config(data_dir)?;
    validate_config(&config)?;
    Ok(config)
}

/// Reject values the services cannot work with.
pub fn validate_config(config: &Config) -> Result<()> {
    if config.max_photos_per_phase == 0 {
        return Err(PermitError::ConfigError(
            "max_photos_per_phase must be at least 1".to_string(),
        ));
    }
    if config.min_photos_per_submit > config.max_photos_per_phase {
        return Err(PermitError::ConfigError(format!(
            "min_photos_per_submit ({}) exceeds max_photos_per_phase ({})",
            config.min_photos_per_submit, config.max_photos_per_phase
        )));
    }
    if config.analysis_concurrency == 0 {
        return Err(PermitError::ConfigError(
            "analysis_concurrency must be at least 1".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&config.detector.confidence_threshold) {
        return Err(PermitError::ConfigError(
            "detector.confidence_threshold must be within 0..1".to_string(),
        ));
    }
    Ok(())
}
