//! File system utilities for permitbot
//!
//! Provides path resolution and JSON file operations.

mod json;
mod paths;

pub use json::{read_config, read_json, write_config, write_json};
pub use paths::{
    find_data_dir, get_config_path, get_data_dir, get_file_root, get_state_path, resolve_cwd,
    DATA_DIR_NAME,
};
