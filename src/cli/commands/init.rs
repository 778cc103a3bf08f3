//! Init command - Create the data directory

use tracing::info;

use crate::cli::GlobalOpts;
use crate::errors::{PermitError, Result};
use crate::fs::{get_config_path, get_data_dir, get_file_root, resolve_cwd, write_config};
use crate::schemas::Config;

/// Create `.permitbot/` with a default config.json and an empty file root.
pub async fn run(opts: &GlobalOpts, force: bool) -> Result<()> {
    let data_dir = match &opts.data_dir {
        Some(dir) => dir.clone(),
        None => get_data_dir(&resolve_cwd(opts.cwd.as_deref())),
    };

    let config_path = get_config_path(&data_dir);
    if config_path.exists() && !force {
        return Err(PermitError::ConfigError(format!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        )));
    }

    let config = Config::default();
    write_config(&data_dir, &config)?;
    std::fs::create_dir_all(get_file_root(&data_dir, &config.file_root))?;

    info!(data_dir = %data_dir.display(), "initialized");
    println!("Initialized {}", data_dir.display());
    Ok(())
}
