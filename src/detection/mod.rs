//! PPE detection
//!
//! The [`Classifier`] trait turns image bytes into labelled detections.
//! [`ProcessClassifier`] delegates to an external detector command and
//! [`Annotator`] draws the detections back onto a copy of the photo.

mod annotate;
mod labels;
mod process;

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::domain::PhotoVerdict;
use crate::errors::Result;

pub use annotate::Annotator;
pub use labels::display_label;
pub use process::ProcessClassifier;

#[cfg(test)]
pub(crate) use annotate::blank_png;

/// Boxed future returned by object-safe async trait methods
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One object found in an image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Model class name, e.g. `person` or `NO-Hardhat`
    #[serde(alias = "class")]
    pub label: String,

    pub confidence: f32,

    /// `[x1, y1, x2, y2]` in pixels
    #[serde(default)]
    pub bbox: [i32; 4],
}

/// Object detector for evidence photos.
///
/// Failures are transient and reported as `PermitError::Classification`.
pub trait Classifier: Send + Sync {
    fn detect<'a>(&'a self, image: &'a [u8]) -> BoxFuture<'a, Result<Vec<Detection>>>;
}

impl Detection {
    /// Whether this detection names a missing piece of PPE
    pub fn is_violation(&self, violation_prefix: &str) -> bool {
        self.label.starts_with(violation_prefix)
    }
}

/// Reduce detections to a verdict for one photo.
pub fn verdict_for(detections: &[Detection], violation_prefix: &str) -> PhotoVerdict {
    PhotoVerdict::from_labels(detections.iter().map(|d| d.label.as_str()), violation_prefix)
}
