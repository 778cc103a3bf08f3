//! Wiring shared by the commands: data directory, config, store and service

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::load_config;
use crate::detection::{Annotator, ProcessClassifier};
use crate::errors::Result;
use crate::files::LocalFileSource;
use crate::fs::{find_data_dir, get_file_root, get_state_path, resolve_cwd};
use crate::schemas::{Config, Employee};
use crate::service::PermitService;
use crate::store::JsonStore;

use super::GlobalOpts;

/// An opened data directory
pub struct Context {
    pub data_dir: PathBuf,
    pub session: String,
    pub service: PermitService,
}

/// Locate the data directory for these options.
pub fn locate_data_dir(opts: &GlobalOpts) -> Result<PathBuf> {
    match &opts.data_dir {
        Some(dir) => Ok(dir.clone()),
        None => find_data_dir(&resolve_cwd(opts.cwd.as_deref())),
    }
}

impl Context {
    pub fn open(opts: &GlobalOpts) -> Result<Self> {
        let data_dir = locate_data_dir(opts)?;
        let config = load_config(&data_dir)?;
        let service = build_service(&data_dir, config)?;
        debug!(data_dir = %data_dir.display(), session = %opts.session, "context opened");
        Ok(Context {
            data_dir,
            session: opts.session.clone(),
            service,
        })
    }

    /// The employee logged in on this session
    pub fn employee(&self) -> Result<Employee> {
        self.service.current_employee(&self.session)
    }

    /// Annotator writing into the configured annotations directory
    pub fn annotator(&self) -> Result<Annotator> {
        let config = self.service.config();
        let dir = get_file_root(&self.data_dir, &config.annotations_dir);
        let annotator = Annotator::new(dir, config.detector.violation_prefix.clone());
        match &config.annotation_font {
            Some(font) => annotator.with_font_file(&get_file_root(&self.data_dir, font)),
            None => Ok(annotator),
        }
    }
}

fn build_service(data_dir: &Path, config: Config) -> Result<PermitService> {
    let store = JsonStore::open(get_state_path(data_dir))?;
    let files = LocalFileSource::new(get_file_root(data_dir, &config.file_root));
    let classifier = ProcessClassifier::new(config.detector.clone());
    Ok(PermitService::new(
        Arc::new(store),
        Arc::new(classifier),
        Arc::new(files),
        config,
    ))
}
