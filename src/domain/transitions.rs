//! State transition logic
//!
//! Pure functions for applying lifecycle transitions to permits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schemas::{Permit, PermitStatus, TimestampPolicy};

use super::states::{rule_for, PermitAction};
use super::validation::{validate_transition, Denial};

/// Outcome of a transition request, handed back to the front end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionDecision {
    pub allowed: bool,

    /// Status after the transition (only when allowed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resulting_status: Option<PermitStatus>,

    /// Why the transition was refused (only when denied)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial: Option<Denial>,
}

impl TransitionDecision {
    pub fn allowed(resulting_status: PermitStatus) -> Self {
        TransitionDecision {
            allowed: true,
            resulting_status: Some(resulting_status),
            denial: None,
        }
    }

    pub fn denied(denial: Denial) -> Self {
        TransitionDecision {
            allowed: false,
            resulting_status: None,
            denial: Some(denial),
        }
    }

    /// Human-readable reason if denied
    pub fn reason(&self) -> Option<String> {
        self.denial.as_ref().map(Denial::reason)
    }
}

/// Result of a state transition attempt
#[derive(Debug)]
pub enum TransitionResult {
    /// Successful transition with the new permit state
    Applied {
        /// The permit with updated status and timestamps
        next_permit: Permit,
    },
    /// Refused transition
    Denied { denial: Denial },
}

impl TransitionResult {
    pub fn is_applied(&self) -> bool {
        matches!(self, TransitionResult::Applied { .. })
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, TransitionResult::Denied { .. })
    }

    /// The decision value reported to callers
    pub fn decision(&self) -> TransitionDecision {
        match self {
            TransitionResult::Applied { next_permit } => TransitionDecision::allowed(next_permit.status),
            TransitionResult::Denied { denial } => TransitionDecision::denied(denial.clone()),
        }
    }

    /// Get the next permit if the transition was applied
    pub fn permit(self) -> Option<Permit> {
        match self {
            TransitionResult::Applied { next_permit } => Some(next_permit),
            TransitionResult::Denied { .. } => None,
        }
    }
}

/// Pure function that applies a lifecycle action to a permit.
///
/// Never mutates the input. On success the returned permit carries the new
/// status; `submit_start` stamps `actual_start_at` and `submit_completion`
/// stamps `actual_end_at`, subject to `policy`.
///
/// # Arguments
/// * `permit` - The current permit
/// * `employee_id` - The requesting employee
/// * `action` - The requested action
/// * `policy` - Whether resubmission refreshes actual timestamps
/// * `now` - The time to stamp
pub fn apply_transition(
    permit: &Permit,
    employee_id: Uuid,
    action: PermitAction,
    policy: TimestampPolicy,
    now: DateTime<Utc>,
) -> TransitionResult {
    let validation = validate_transition(permit, employee_id, action);
    if let Some(denial) = validation.denial {
        return TransitionResult::Denied { denial };
    }

    let mut next_permit = permit.clone().with_status(rule_for(action).to);
    match action {
        PermitAction::SubmitStart => {
            next_permit.actual_start_at = stamp(permit.actual_start_at, policy, now);
        }
        PermitAction::SubmitCompletion => {
            next_permit.actual_end_at = stamp(permit.actual_end_at, policy, now);
        }
        _ => {}
    }

    TransitionResult::Applied { next_permit }
}

fn stamp(
    existing: Option<DateTime<Utc>>,
    policy: TimestampPolicy,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match (policy, existing) {
        (TimestampPolicy::KeepFirst, Some(first)) => Some(first),
        _ => Some(now),
    }
}

/// Actions `employee_id` could successfully request right now.
pub fn available_actions(permit: &Permit, employee_id: Uuid) -> Vec<PermitAction> {
    super::states::PERMIT_ACTIONS
        .iter()
        .copied()
        .filter(|action| validate_transition(permit, employee_id, *action).valid)
        .collect()
}
