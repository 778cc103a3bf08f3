//! Evidence gate
//!
//! Per-photo PPE verdicts and their aggregation into one advisory verdict for
//! a batch. The gate never blocks approve/reject decisions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schemas::Phase;

use super::states::PermitAction;

/// The evidence phase that must have photos before `action` makes sense.
///
/// Only submits are evidence-gated; decisions are not.
pub fn evidence_phase_for(action: PermitAction) -> Option<Phase> {
    if action.is_submit() {
        Some(action.phase())
    } else {
        None
    }
}

/// Classifier verdict for a single photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PhotoVerdict {
    /// No violation labels detected
    Pass,
    /// At least one violation label detected
    Fail { violations: Vec<String> },
    /// Download or classification failed; excluded from the tally
    Inconclusive { error: String },
}

impl PhotoVerdict {
    /// Reduce a list of detected labels to pass/fail.
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a str>, violation_prefix: &str) -> Self {
        let violations: Vec<String> = labels
            .into_iter()
            .filter(|label| label.starts_with(violation_prefix))
            .map(str::to_string)
            .collect();
        if violations.is_empty() {
            PhotoVerdict::Pass
        } else {
            PhotoVerdict::Fail { violations }
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, PhotoVerdict::Pass)
    }

    pub fn is_inconclusive(&self) -> bool {
        matches!(self, PhotoVerdict::Inconclusive { .. })
    }

    /// Status line shown under each analysed photo
    pub fn status_text(&self) -> &'static str {
        match self {
            PhotoVerdict::Pass => "Нарушений СИЗ не обнаружено",
            PhotoVerdict::Fail { .. } => "Обнаружены нарушения СИЗ",
            PhotoVerdict::Inconclusive { .. } => "Ошибка обработки",
        }
    }
}

/// Why a batch verdict could not be formed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndeterminateCause {
    /// The permit has no photos for this phase
    NoPhotos,
    /// Every photo failed to download or classify
    ProcessingFailed,
}

/// Overall verdict for one batch of photos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum ComplianceVerdict {
    FullyCompliant,
    PartiallyCompliant { passed: usize, of: usize },
    NonCompliant,
    Indeterminate { cause: IndeterminateCause },
}

impl ComplianceVerdict {
    /// Verdict text shown to the supervisor
    pub fn summary(&self) -> String {
        match self {
            ComplianceVerdict::FullyCompliant => "✅ СИЗ соблюдены на всех фотографиях!".to_string(),
            ComplianceVerdict::PartiallyCompliant { passed, of } => {
                format!("⚠️ СИЗ соблюдены на {} из {} фотографий", passed, of)
            }
            ComplianceVerdict::NonCompliant => {
                "❌ Нарушения СИЗ обнаружены на всех фотографиях!".to_string()
            }
            ComplianceVerdict::Indeterminate {
                cause: IndeterminateCause::NoPhotos,
            } => "❌ Фотографии не найдены".to_string(),
            ComplianceVerdict::Indeterminate {
                cause: IndeterminateCause::ProcessingFailed,
            } => "❌ Не удалось обработать ни одной фотографии".to_string(),
        }
    }
}

/// Tally over a batch of photo verdicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceTally {
    pub passed: usize,
    pub failed: usize,
    pub inconclusive: usize,
}

impl ComplianceTally {
    pub fn from_verdicts<'a>(verdicts: impl IntoIterator<Item = &'a PhotoVerdict>) -> Self {
        let mut tally = ComplianceTally {
            passed: 0,
            failed: 0,
            inconclusive: 0,
        };
        for verdict in verdicts {
            match verdict {
                PhotoVerdict::Pass => tally.passed += 1,
                PhotoVerdict::Fail { .. } => tally.failed += 1,
                PhotoVerdict::Inconclusive { .. } => tally.inconclusive += 1,
            }
        }
        tally
    }

    /// Photos that produced a pass/fail result
    pub fn conclusive(&self) -> usize {
        self.passed + self.failed
    }

    /// All photos attempted, including inconclusive ones
    pub fn processed(&self) -> usize {
        self.conclusive() + self.inconclusive
    }

    /// Aggregate the tally into one verdict.
    pub fn verdict(&self) -> ComplianceVerdict {
        let conclusive = self.conclusive();
        if conclusive == 0 {
            let cause = if self.inconclusive == 0 {
                IndeterminateCause::NoPhotos
            } else {
                IndeterminateCause::ProcessingFailed
            };
            return ComplianceVerdict::Indeterminate { cause };
        }
        if self.passed == conclusive {
            ComplianceVerdict::FullyCompliant
        } else if self.passed > 0 {
            ComplianceVerdict::PartiallyCompliant {
                passed: self.passed,
                of: conclusive,
            }
        } else {
            ComplianceVerdict::NonCompliant
        }
    }
}

/// Result of analysing one photo in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoOutcome {
    /// Position in upload order
    pub index: usize,
    pub photo_id: Uuid,
    pub file_handle: String,
    pub verdict: PhotoVerdict,
    /// Display labels of everything detected
    #[serde(default)]
    pub detected: Vec<String>,
    /// Annotated copy of the photo, when one was requested and drawn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotated: Option<PathBuf>,
}

/// Full compliance check result for one permit phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub permit_number: String,
    pub phase: Phase,
    pub verdict: ComplianceVerdict,
    pub tally: ComplianceTally,
    /// Per-photo results in upload order
    pub outcomes: Vec<PhotoOutcome>,
}

impl ComplianceReport {
    /// Build a report; outcomes are re-sorted into upload order.
    pub fn new(permit_number: impl Into<String>, phase: Phase, mut outcomes: Vec<PhotoOutcome>) -> Self {
        outcomes.sort_by_key(|o| o.index);
        let tally = ComplianceTally::from_verdicts(outcomes.iter().map(|o| &o.verdict));
        ComplianceReport {
            permit_number: permit_number.into(),
            phase,
            verdict: tally.verdict(),
            tally,
            outcomes,
        }
    }

    /// Number of photos shown to the caller as processed
    pub fn processed(&self) -> usize {
        self.tally.processed()
    }
}
