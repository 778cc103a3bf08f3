//! Config schema - Configuration for permitbot

use serde::{Deserialize, Serialize};

/// What happens to actual start/end timestamps when evidence is resubmitted
/// after a rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimestampPolicy {
    /// Every submit stamps the current time
    #[default]
    RefreshOnSubmit,
    /// The first submit wins; later submits keep the stored timestamp
    KeepFirst,
}

/// External object detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Command to execute; receives the image path as its last argument
    pub command: String,

    /// Arguments passed before the image path
    #[serde(default)]
    pub args: Vec<String>,

    /// Detections below this confidence are discarded
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Labels starting with this prefix are PPE violations
    #[serde(default = "default_violation_prefix")]
    pub violation_prefix: String,

    /// Per-image timeout in seconds
    #[serde(default = "default_detector_timeout")]
    pub timeout_seconds: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            command: "ppe-detect".to_string(),
            args: vec!["--format".to_string(), "json".to_string()],
            confidence_threshold: default_confidence_threshold(),
            violation_prefix: default_violation_prefix(),
            timeout_seconds: default_detector_timeout(),
        }
    }
}

/// Main configuration for permitbot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for forward compatibility
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Upload cap per phase per submission cycle
    #[serde(default = "default_max_photos")]
    pub max_photos_per_phase: usize,

    /// Photos an upload session must collect before it can be finished
    #[serde(default = "default_min_photos")]
    pub min_photos_per_submit: usize,

    #[serde(default)]
    pub timestamp_policy: TimestampPolicy,

    /// Directory transport file handles resolve against, relative to the data dir
    #[serde(default = "default_file_root")]
    pub file_root: String,

    /// Photos analysed in parallel during a compliance check
    #[serde(default = "default_analysis_concurrency")]
    pub analysis_concurrency: usize,

    #[serde(default)]
    pub detector: DetectorConfig,

    /// Where annotated photo copies are written, relative to the data dir
    #[serde(default = "default_annotations_dir")]
    pub annotations_dir: String,

    /// TrueType font for annotation labels; a system font is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation_font: Option<String>,
}

fn default_schema_version() -> u32 {
    1
}

fn default_max_photos() -> usize {
    10
}

fn default_min_photos() -> usize {
    1
}

fn default_file_root() -> String {
    "files".to_string()
}

fn default_analysis_concurrency() -> usize {
    4
}

fn default_annotations_dir() -> String {
    "annotations".to_string()
}

fn default_confidence_threshold() -> f32 {
    0.4
}

fn default_violation_prefix() -> String {
    "NO-".to_string()
}

fn default_detector_timeout() -> u32 {
    120
}

impl Default for Config {
    fn default() -> Self {
        Config {
            schema_version: default_schema_version(),
            max_photos_per_phase: default_max_photos(),
            min_photos_per_submit: default_min_photos(),
            timestamp_policy: TimestampPolicy::RefreshOnSubmit,
            file_root: default_file_root(),
            analysis_concurrency: default_analysis_concurrency(),
            detector: DetectorConfig::default(),
            annotations_dir: default_annotations_dir(),
            annotation_font: None,
        }
    }
}
