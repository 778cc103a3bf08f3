//! CLI command implementations

pub mod analyze;
pub mod auth;
pub mod decide;
pub mod import;
pub mod init;
pub mod list;
pub mod photos;
pub mod show;
pub mod submit;
